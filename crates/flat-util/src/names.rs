use std::collections::HashSet;

/// Supply of fresh symbol names.
///
/// Transformations that invent nonterminals (START, BIN, TERM, left recursion
/// removal) thread one of these through instead of relying on a global
/// counter. A fresh name is the hint itself if it is unused, otherwise the
/// hint with as many primes appended as needed.
#[derive(Clone, Debug, Default)]
pub struct NameSupply {
    taken: HashSet<String>,
}

impl NameSupply {
    pub fn new<I, S>(taken: I) -> NameSupply
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameSupply {
            taken: taken.into_iter().map(Into::into).collect(),
        }
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn fresh(&mut self, hint: &str) -> String {
        let mut candidate = hint.to_string();
        while self.taken.contains(&candidate) {
            candidate.push('\'');
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_never_collide() {
        let mut names = NameSupply::new(["S", "S'", "A"]);
        assert_eq!(names.fresh("S"), "S''");
        assert_eq!(names.fresh("S"), "S'''");
        assert_eq!(names.fresh("B"), "B");
        assert_eq!(names.fresh("B"), "B'");
        assert!(names.is_taken("A"));
    }
}
