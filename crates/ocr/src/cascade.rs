//! Ordered fallback strategies: run each in turn, stop at the first one that
//! finds something. Errors and empty results both mean "try the next one".

use std::fmt::Display;
use tracing::debug;

/// Whether a strategy's output counts as a hit.
pub trait Found {
    fn found(&self) -> bool;
}

impl Found for String {
    fn found(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Found for Vec<T> {
    fn found(&self) -> bool {
        !self.is_empty()
    }
}

type StepFn<'a, T, E> = Box<dyn FnOnce() -> Result<T, E> + 'a>;

pub struct Cascade<'a, T, E> {
    stage: &'static str,
    steps: Vec<(String, StepFn<'a, T, E>)>,
}

impl<'a, T: Found, E: Display> Cascade<'a, T, E> {
    pub fn new(stage: &'static str) -> Self {
        Self { stage, steps: Vec::new() }
    }

    pub fn step(
        mut self,
        name: impl Into<String>,
        run: impl FnOnce() -> Result<T, E> + 'a,
    ) -> Self {
        self.steps.push((name.into(), Box::new(run)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run steps in insertion order. Returns the first hit and the name of the
    /// step that produced it; later steps are never invoked.
    pub fn run(self) -> Option<(String, T)> {
        let stage = self.stage;
        for (name, run) in self.steps {
            match run() {
                Ok(out) if out.found() => {
                    debug!(stage, step = %name, "strategy hit");
                    return Some((name, out));
                }
                Ok(_) => debug!(stage, step = %name, "strategy found nothing"),
                Err(e) => debug!(stage, step = %name, "strategy failed: {e}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn stops_at_first_hit() {
        let calls = Cell::new(0);
        let hit = Cascade::<String, String>::new("test")
            .step("empty", || {
                calls.set(calls.get() + 1);
                Ok(String::new())
            })
            .step("boom", || {
                calls.set(calls.get() + 1);
                Err("engine exploded".to_string())
            })
            .step("hit", || {
                calls.set(calls.get() + 1);
                Ok("text".to_string())
            })
            .step("never", || {
                calls.set(calls.get() + 1);
                Ok("late".to_string())
            })
            .run();
        assert_eq!(hit, Some(("hit".to_string(), "text".to_string())));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn all_empty_is_none() {
        let c = Cascade::<Vec<u8>, String>::new("test")
            .step("a", || Ok(vec![]))
            .step("b", || Err("nope".into()));
        assert_eq!(c.len(), 2);
        assert!(c.run().is_none());
    }

    #[test]
    fn no_steps_is_none() {
        let c = Cascade::<String, String>::new("test");
        assert!(c.is_empty());
        assert!(c.run().is_none());
    }
}
