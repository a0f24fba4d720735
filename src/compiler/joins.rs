/// Alias of the structure table row every statement selects from.
pub const MAIN_ALIAS: &str = "s";

/// Left join of the indexes table for one member path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberJoin {
    pub member_path: String,
    pub alias: String,
}

/// Member joins of one statement, allocated as `mem0`, `mem1`... in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberJoins {
    joins: Vec<MemberJoin>,
}

impl MemberJoins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias joined for `member_path`, allocating a new join on first use.
    pub fn alias_for(&mut self, member_path: &str) -> &str {
        let index = match self.position(member_path) {
            Some(index) => index,
            None => {
                let alias = format!("mem{}", self.joins.len());
                self.joins.push(MemberJoin {
                    member_path: member_path.to_string(),
                    alias,
                });
                self.joins.len() - 1
            }
        };
        &self.joins[index].alias
    }

    pub fn get(&self, member_path: &str) -> Option<&MemberJoin> {
        self.position(member_path).map(|index| &self.joins[index])
    }

    fn position(&self, member_path: &str) -> Option<usize> {
        self.joins.iter().position(|j| j.member_path == member_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberJoin> {
        self.joins.iter()
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_reused_per_path() {
        let mut joins = MemberJoins::new();

        assert_eq!(joins.alias_for("Age"), "mem0");
        assert_eq!(joins.alias_for("Name"), "mem1");
        assert_eq!(joins.alias_for("Age"), "mem0");
        assert_eq!(joins.len(), 2);
    }
}
