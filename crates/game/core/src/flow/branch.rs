use super::{FlowError, Step};

/// Result of a flow combinator: a single step or a nested list of branches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Branch {
    Step(Step),
    Seq(Vec<Branch>),
}

impl Branch {
    /// An empty sequence. Still counts as a present branch for `pick`.
    pub const fn empty() -> Self {
        Self::Seq(Vec::new())
    }

    /// Flattens into plan order, rejecting nesting deeper than `max_depth`.
    pub fn flatten(self, max_depth: usize) -> Result<Vec<Step>, FlowError> {
        let mut steps = Vec::new();
        self.flatten_into(&mut steps, 0, max_depth)?;
        Ok(steps)
    }

    fn flatten_into(
        self,
        out: &mut Vec<Step>,
        depth: usize,
        max_depth: usize,
    ) -> Result<(), FlowError> {
        match self {
            Self::Step(step) => out.push(step),
            Self::Seq(children) => {
                if depth >= max_depth {
                    return Err(FlowError::NestingTooDeep { limit: max_depth });
                }
                for child in children {
                    child.flatten_into(out, depth + 1, max_depth)?;
                }
            }
        }
        Ok(())
    }

    /// Splices nested sequences one level up.
    pub fn flatten_once(self) -> Self {
        match self {
            Self::Seq(children) => Self::Seq(
                children
                    .into_iter()
                    .flat_map(|child| match child {
                        Self::Seq(inner) => inner,
                        step => vec![step],
                    })
                    .collect(),
            ),
            step => step,
        }
    }
}

impl From<Step> for Branch {
    fn from(step: Step) -> Self {
        Self::Step(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str) -> Branch {
        Branch::Step(Step::new(name, ()))
    }

    fn nested(depth: usize) -> Branch {
        (0..depth).fold(step("leaf"), |inner, _| Branch::Seq(vec![inner]))
    }

    #[test]
    fn flatten_preserves_order() {
        let branch = Branch::Seq(vec![
            step("a"),
            Branch::Seq(vec![step("b"), Branch::empty(), step("c")]),
            step("d"),
        ]);
        let names: Vec<_> = branch
            .flatten(8)
            .unwrap()
            .into_iter()
            .map(|s| s.name.to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn flatten_depth_is_bounded() {
        assert_eq!(nested(4).flatten(4).unwrap().len(), 1);
        assert_eq!(
            nested(5).flatten(4),
            Err(FlowError::NestingTooDeep { limit: 4 })
        );
    }

    #[test]
    fn flatten_once_only_lifts_one_level() {
        let branch = Branch::Seq(vec![
            Branch::Seq(vec![step("a"), Branch::Seq(vec![step("b")])]),
            step("c"),
        ]);
        assert_eq!(
            branch.flatten_once(),
            Branch::Seq(vec![step("a"), Branch::Seq(vec![step("b")]), step("c")])
        );
    }
}
