use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 等价于 `(0..h).flat_map(move |i| (0..w).map(move |j| (i, j)))`,
/// 但手写结构体积更小, 并且能精确给出剩余长度.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self { cur: 0, h, w }
    }

    #[inline]
    fn total(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.total() {
            return None;
        }
        let pos = (self.cur / self.w, self.cur % self.w);
        self.cur += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.total() - self.cur;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PosIter {}

#[cfg(test)]
mod completeness_tests {
    use super::PosIter;
    use crate::Idx2d;

    fn pos_iter_builtin((h, w): Idx2d) -> impl Iterator<Item = Idx2d> {
        (0..h).flat_map(move |first| (0..w).map(move |second| (first, second)))
    }

    #[test]
    fn test_pos_iter() {
        for i in 0..=4 {
            for j in 0..=4 {
                let tup = (i, j);
                assert!(Iterator::eq(pos_iter_builtin(tup), PosIter::new(tup)));
                assert_eq!(PosIter::new(tup).len(), i * j);
            }
        }
    }

    #[test]
    fn test_pos_iter_len_shrinks() {
        let mut it = PosIter::new((2, 3));
        it.next();
        it.next();
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some((0, 2)));
        assert_eq!(it.next(), Some((1, 0)));
    }
}
