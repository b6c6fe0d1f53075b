//! Scoped worker pool. Used by [`crate::walker`] (one worker per root) and
//! [`crate::pipeline`] (one worker per stage) so that thread teardown is
//! structurally guaranteed by `std::thread::scope` rather than relying on
//! manual join bookkeeping.

use std::any::Any;
use std::fmt;
use std::thread;

pub struct WorkerScope<'scope, 'env, T> {
    inner: &'scope thread::Scope<'scope, 'env>,
    handles: Vec<(String, thread::ScopedJoinHandle<'scope, T>)>,
}

impl<'work_scope, 'scope, 'env, T> WorkerScope<'scope, 'env, T> {
    pub fn spawn<F>(&'work_scope mut self, name: impl AsRef<str>, f: F)
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let name = name.as_ref();
        let index = self.num_spawned();
        let name = format!("{name}{index:>02}");
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(self.inner, f)
            .expect("the name does not contain null bytes");
        self.handles.push((name, handle));
    }

    pub fn num_spawned(&self) -> usize {
        self.handles.len()
    }
}

pub struct CaughtPanic(pub Box<dyn Any + Send + 'static>);

pub struct FinishedWorker<T> {
    pub name: String,
    pub result: Result<T, CaughtPanic>,
}

pub fn scoped_workers<'env, F, T>(f: F) -> Vec<FinishedWorker<T>>
where
    F: for<'scope, 'work_scope> FnOnce(&'work_scope mut WorkerScope<'scope, 'env, T>),
{
    thread::scope(|scope| {
        let mut scope = WorkerScope {
            inner: scope,
            handles: vec![],
        };
        f(&mut scope);
        scope
            .handles
            .into_iter()
            .map(|(name, handle)| FinishedWorker {
                name,
                result: handle.join().map_err(CaughtPanic),
            })
            .collect()
    })
}

impl fmt::Display for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let panic = &self.0;
        let string = panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| format!("non-string panic payload: {:?}", panic.type_id()));
        write!(f, "{string}")
    }
}

impl fmt::Debug for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaughtPanic({self})")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn runs_workers_and_collects_results() {
        let results = scoped_workers(|scope: &mut WorkerScope<i32>| {
            for i in 0..4 {
                scope.spawn("worker-", move || i * 2);
            }
        });

        let mut values: Vec<i32> = results.into_iter().map(|w| w.result.unwrap()).collect();
        values.sort();
        assert_eq!(values, vec![0, 2, 4, 6]);
    }

    #[test]
    fn names_are_indexed_and_padded() {
        let results = scoped_workers(|scope: &mut WorkerScope<()>| {
            for _ in 0..3 {
                scope.spawn("w", || ());
            }
        });
        let mut names: Vec<String> = results.into_iter().map(|w| w.name).collect();
        names.sort();
        assert_eq!(names, vec!["w00", "w01", "w02"]);
    }

    #[test]
    fn panics_are_caught_per_worker() {
        let results = scoped_workers(|scope: &mut WorkerScope<i32>| {
            scope.spawn("ok-", || 1);
            scope.spawn("bad-", || panic!("boom"));
        });

        let oks = results.iter().filter(|w| w.result.is_ok()).count();
        let errs = results.iter().filter(|w| w.result.is_err()).count();
        assert_eq!(oks, 1);
        assert_eq!(errs, 1);
    }
}
