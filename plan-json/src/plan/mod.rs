//! The compiled type plan.

mod compiler;
mod frame;

pub use compiler::Compiler;
pub use frame::{FrameIndex, FrameKind, FrameOps, PlanFrame, ScalarKind, StructField};

/// A flat, index-addressable description of a destination type, compiled
/// once from a [`crate::shape::Shape`] and then reused across every
/// [`crate::Decoder::decode`] call against that type.
pub struct Plan {
    pub(crate) frames: Vec<PlanFrame>,
}

impl Plan {
    pub(crate) fn frame(&self, idx: FrameIndex) -> &PlanFrame {
        &self.frames[idx]
    }

    pub fn root(&self) -> FrameIndex {
        0
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Renders the plan as a tree via `ptree`, parent-to-children, for
    /// development and for the crate's own tests — not part of the
    /// decode contract, just an operational convenience for inspecting a
    /// compiled plan's shape.
    pub fn debug_tree(&self) -> std::io::Result<String> {
        let mut children: Vec<Vec<FrameIndex>> = vec![Vec::new(); self.frames.len()];
        for (idx, frame) in self.frames.iter().enumerate() {
            if let Some(parent) = frame.parent {
                if parent != idx {
                    children[parent].push(idx);
                }
            }
        }
        let item = DebugItem { plan: self, idx: 0, children };
        let mut out = Vec::new();
        ptree::write_tree(&item, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

struct DebugItem<'p> {
    plan: &'p Plan,
    idx: FrameIndex,
    children: Vec<Vec<FrameIndex>>,
}

impl<'p> Clone for DebugItem<'p> {
    fn clone(&self) -> Self {
        DebugItem { plan: self.plan, idx: self.idx, children: self.children.clone() }
    }
}

impl<'p> ptree::TreeItem for DebugItem<'p> {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        let frame = self.plan.frame(self.idx);
        write!(f, "#{} {:?} size={} offset={}", self.idx, frame.kind, frame.size, frame.offset)
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::Owned(
            self.children[self.idx]
                .iter()
                .map(|&idx| DebugItem { plan: self.plan, idx, children: self.children.clone() })
                .collect(),
        )
    }
}
