use core::{
    fmt,
    ops::{
        Index,
        IndexMut,
    },
};

use crate::script_deploy::HGW;

/// One leg of an attack batch.
///
/// `CorrectionWeaken` runs the same script as `Weaken` but is sized to undo
/// the security raised by the grow leg, so it is tracked separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Weaken,
    Grow,
    CorrectionWeaken,
    Hack,
}

impl Operation {
    /// Allocation priority: security first, money second, stealing last.
    pub const PRIORITY: [Operation; 4] = [
        Operation::Weaken,
        Operation::Grow,
        Operation::CorrectionWeaken,
        Operation::Hack,
    ];

    pub fn primitive(&self) -> HGW {
        use Operation::*;

        match self {
            Weaken | CorrectionWeaken => HGW::Weaken,
            Grow => HGW::Grow,
            Hack => HGW::Hack,
        }
    }

    pub fn priority(&self) -> usize {
        use Operation::*;

        match self {
            Weaken => 0,
            Grow => 1,
            CorrectionWeaken => 2,
            Hack => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        use Operation::*;

        match self {
            Weaken => "Weaken",
            Grow => "Grow",
            CorrectionWeaken => "GrowWeaken",
            Hack => "Hack",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A thread count for each of the four operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadCounts {
    pub weaken: usize,
    pub grow: usize,
    pub correction_weaken: usize,
    pub hack: usize,
}

impl ThreadCounts {
    pub fn total(&self) -> usize {
        self.iter().fold(0usize, |acc, (_, t)| acc.saturating_add(t))
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Iterates in allocation priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Operation, usize)> + '_ {
        Operation::PRIORITY.iter().map(move |op| (*op, self[*op]))
    }

    pub fn saturating_sub(
        &self,
        other: &ThreadCounts,
    ) -> ThreadCounts {
        let mut retval = ThreadCounts::default();
        for op in Operation::PRIORITY {
            retval[op] = self[op].saturating_sub(other[op]);
        }

        retval
    }
}

impl Index<Operation> for ThreadCounts {
    type Output = usize;

    fn index(
        &self,
        op: Operation,
    ) -> &usize {
        use Operation::*;

        match op {
            Weaken => &self.weaken,
            Grow => &self.grow,
            CorrectionWeaken => &self.correction_weaken,
            Hack => &self.hack,
        }
    }
}

impl IndexMut<Operation> for ThreadCounts {
    fn index_mut(
        &mut self,
        op: Operation,
    ) -> &mut usize {
        use Operation::*;

        match op {
            Weaken => &mut self.weaken,
            Grow => &mut self.grow,
            CorrectionWeaken => &mut self.correction_weaken,
            Hack => &mut self.hack,
        }
    }
}

impl fmt::Display for ThreadCounts {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut first = true;
        for (op, threads) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;

            write!(f, "[{}: {}]", op, threads)?;
        }

        Ok(())
    }
}
