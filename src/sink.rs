use std::io::Write;

use num_bigint::BigInt;

/// Receives the values produced by Output instructions, in execution order.
///
/// The machine is generic over its sink so a run can collect values, stream
/// them to stdout, or just count them.
pub trait OutputSink {
    fn emit(&mut self, value: &BigInt);
}

impl OutputSink for Vec<BigInt> {
    fn emit(&mut self, value: &BigInt) {
        self.push(value.clone());
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, value: &BigInt) {
        (**self).emit(value);
    }
}

/// Prints each value on its own line to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, value: &BigInt) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = writeln!(lock, "{value}") {
            tracing::warn!("failed to write output value {value}: {e}");
        }
    }
}

/// Discards values but remembers how many were emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingSink {
    pub count: usize,
}

impl OutputSink for CountingSink {
    fn emit(&mut self, _value: &BigInt) {
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collects_in_order() {
        let mut sink: Vec<BigInt> = Vec::new();
        sink.emit(&BigInt::from(3));
        sink.emit(&BigInt::from(-1));
        assert_eq!(sink, vec![BigInt::from(3), BigInt::from(-1)]);
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn feed<S: OutputSink>(mut sink: S) {
            sink.emit(&BigInt::from(9));
        }
        let mut collected: Vec<BigInt> = Vec::new();
        feed(&mut collected);
        feed(&mut collected);
        assert_eq!(collected, vec![BigInt::from(9), BigInt::from(9)]);
    }

    #[test]
    fn test_counting() {
        let mut sink = CountingSink::default();
        for v in 0..5 {
            sink.emit(&BigInt::from(v));
        }
        assert_eq!(sink.count, 5);
    }
}
