//! Scoped scratch allocator ("stack") for per-call temporaries.
//!
//! Mirrors `mjMARKSTACK`/`mjFREESTACK`: a routine that needs working buffers
//! marks the current position, allocates, and is guaranteed the mark is
//! restored on every exit path, including early returns and errors, by
//! running the restore through [`Scratch::scoped`] rather than manual
//! bookkeeping.

/// A flat arena of `f64` scratch space, reused across stages.
///
/// No heap allocation happens on the step path in steady state: the arena
/// only grows the first time a stage needs more scratch than it has ever
/// needed before, which in practice means it grows once during warm-up and
/// never again for a fixed model.
#[derive(Debug, Default)]
pub struct Scratch {
    buf: Vec<f64>,
    len: usize,
}

impl Scratch {
    pub fn new() -> Self {
        Scratch { buf: Vec::new(), len: 0 }
    }

    /// Mark the current position. Pair with [`Scratch::scoped`] to get an
    /// automatic restore.
    pub fn mark(&self) -> usize {
        self.len
    }

    /// Restore to a previously returned mark, discarding anything allocated
    /// since.
    pub fn free_to(&mut self, mark: usize) {
        debug_assert!(mark <= self.len, "scratch mark outlived its allocator");
        self.len = mark;
    }

    /// Allocate `n` zeroed scratch slots, growing the backing buffer if
    /// necessary.
    pub fn alloc(&mut self, n: usize) -> ScratchSlice<'_> {
        let start = self.len;
        let end = start + n;
        if end > self.buf.len() {
            self.buf.resize(end, 0.0);
        }
        for v in &mut self.buf[start..end] {
            *v = 0.0;
        }
        self.len = end;
        ScratchSlice {
            buf: &mut self.buf,
            start,
            end,
        }
    }

    /// Run `f` with a fresh mark, restoring it afterward regardless of how
    /// `f` returns. This is the preferred entry point: it makes the
    /// mark/free discipline structural rather than a convention the caller
    /// has to remember.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Scratch) -> T) -> T {
        let mark = self.mark();
        let result = f(self);
        self.free_to(mark);
        result
    }
}

/// A live view into scratch space, indexable like a normal slice.
pub struct ScratchSlice<'a> {
    buf: &'a mut Vec<f64>,
    start: usize,
    end: usize,
}

impl std::ops::Deref for ScratchSlice<'_> {
    type Target = [f64];
    fn deref(&self) -> &[f64] {
        &self.buf[self.start..self.end]
    }
}

impl std::ops::DerefMut for ScratchSlice<'_> {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.buf[self.start..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_restores_mark_on_early_return() {
        let mut s = Scratch::new();
        {
            let mut buf = s.alloc(4);
            buf[0] = 1.0;
        }
        let before = s.mark();
        let _ = s.scoped(|inner| {
            inner.alloc(16);
            // simulate an early-exit path
            if true {
                return 0;
            }
            1
        });
        assert_eq!(s.mark(), before);
    }
}
