//! Reusable zone fixtures.
//!
//! - [`tiny_config`]: 64-byte segments so a handful of requests exercise
//!   expansion, retention and the growth clamp.
//! - [`scenario_config`]: production defaults, for reproducing the
//!   reference segment-size sequence.
//! - [`Expr`]: an expression tree whose nodes, names and argument lists all
//!   live in the zone, the workload zones are built for.

use strata_zone::{Zone, ZoneConfig, ZoneObject};

/// Small segments: min 64 B, max 256 B, keep up to 128 B, excess at 1 KiB.
pub fn tiny_config() -> ZoneConfig {
    ZoneConfig::new()
        .with_min_segment_bytes(64)
        .with_max_segment_bytes(256)
        .with_max_kept_segment_bytes(128)
        .with_excess_threshold_bytes(1024)
}

/// Default sizing: min 8 KiB, max 1 MiB, keep up to 64 KiB.
pub fn scenario_config() -> ZoneConfig {
    ZoneConfig::default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

/// Expression syntax tree node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Expr<'z> {
    Number(f64),
    Name(&'z str),
    Binary {
        op: BinaryOp,
        lhs: &'z Expr<'z>,
        rhs: &'z Expr<'z>,
    },
    /// Calls evaluate to the sum of their arguments.
    Call {
        callee: &'z str,
        args: &'z [&'z Expr<'z>],
    },
}

impl ZoneObject for Expr<'_> {}

impl<'z> Expr<'z> {
    pub fn number(zone: &'z Zone, value: f64) -> &'z Expr<'z> {
        Expr::Number(value).new_in(zone)
    }

    pub fn name(zone: &'z Zone, name: &str) -> &'z Expr<'z> {
        let name: &'z str = zone.alloc_str(name);
        Expr::Name(name).new_in(zone)
    }

    pub fn binary(
        zone: &'z Zone,
        op: BinaryOp,
        lhs: &'z Expr<'z>,
        rhs: &'z Expr<'z>,
    ) -> &'z Expr<'z> {
        Expr::Binary { op, lhs, rhs }.new_in(zone)
    }

    pub fn call(zone: &'z Zone, callee: &str, args: &[&'z Expr<'z>]) -> &'z Expr<'z> {
        let callee: &'z str = zone.alloc_str(callee);
        let args: &'z [&'z Expr<'z>] = zone.alloc_slice_copy(args);
        Expr::Call { callee, args }.new_in(zone)
    }

    /// Left-nested `0 + 1 + ... + (n - 1)`.
    pub fn sum_chain(zone: &'z Zone, n: usize) -> &'z Expr<'z> {
        let mut acc = Expr::number(zone, 0.0);
        for i in 1..n {
            let rhs = Expr::number(zone, i as f64);
            acc = Expr::binary(zone, BinaryOp::Add, acc, rhs);
        }
        acc
    }

    /// Value of the expression, or `None` if it mentions a free name.
    pub fn evaluate(&self) -> Option<f64> {
        match *self {
            Expr::Number(value) => Some(value),
            Expr::Name(_) => None,
            Expr::Binary { op, lhs, rhs } => {
                let (l, r) = (lhs.evaluate()?, rhs.evaluate()?);
                Some(match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                })
            }
            Expr::Call { args, .. } => args
                .iter()
                .try_fold(0.0, |acc, arg| Some(acc + arg.evaluate()?)),
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match *self {
            Expr::Number(_) | Expr::Name(_) => 1,
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.node_count() + rhs.node_count(),
            Expr::Call { args, .. } => 1 + args.iter().map(|a| a.node_count()).sum::<usize>(),
        }
    }
}
