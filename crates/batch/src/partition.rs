//! Contiguous split of the cell list across independent workers.

use std::ops::Range;

use crate::error::BatchError;

/// Position of one worker among `n_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    task_id: usize,
    n_tasks: usize,
}

impl Partition {
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] if `n_tasks` is zero or
    /// `task_id >= n_tasks`.
    pub fn new(task_id: usize, n_tasks: usize) -> Result<Self, BatchError> {
        if n_tasks == 0 {
            return Err(BatchError::InvalidConfig {
                reason: "n_tasks must be at least 1".to_string(),
            });
        }
        if task_id >= n_tasks {
            return Err(BatchError::InvalidConfig {
                reason: format!("task_id {task_id} >= n_tasks {n_tasks}"),
            });
        }
        Ok(Self { task_id, n_tasks })
    }

    /// The whole grid on one worker.
    pub fn single() -> Self {
        Self {
            task_id: 0,
            n_tasks: 1,
        }
    }

    pub fn task_id(&self) -> usize {
        self.task_id
    }

    pub fn n_tasks(&self) -> usize {
        self.n_tasks
    }

    /// This worker's index range over `total` cells.
    ///
    /// Every worker gets `total / n_tasks` cells; the last one also takes the
    /// remainder.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] if `require_even` is set and
    /// `total` is not a multiple of `n_tasks`.
    pub fn range(&self, total: usize, require_even: bool) -> Result<Range<usize>, BatchError> {
        let remainder = total % self.n_tasks;
        if require_even && remainder != 0 {
            return Err(BatchError::InvalidConfig {
                reason: format!(
                    "{total} cells do not split evenly over {} tasks (remainder {remainder})",
                    self.n_tasks
                ),
            });
        }
        let chunk = total / self.n_tasks;
        let start = self.task_id * chunk;
        let end = if self.task_id + 1 == self.n_tasks {
            total
        } else {
            start + chunk
        };
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(total: usize, n_tasks: usize) -> Vec<Range<usize>> {
        (0..n_tasks)
            .map(|t| Partition::new(t, n_tasks).unwrap().range(total, false).unwrap())
            .collect()
    }

    #[test]
    fn tiles_every_total_exactly_once() {
        for total in 0..40 {
            for n_tasks in 1..9 {
                let mut seen = vec![0u32; total];
                for r in ranges(total, n_tasks) {
                    for i in r {
                        seen[i] += 1;
                    }
                }
                assert!(seen.iter().all(|&c| c == 1), "total={total} n={n_tasks}");
            }
        }
    }

    #[test]
    fn last_task_takes_remainder() {
        assert_eq!(ranges(10, 3), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn fewer_cells_than_tasks() {
        assert_eq!(ranges(2, 4), vec![0..0, 0..0, 0..0, 0..2]);
    }

    #[test]
    fn even_split_enforced_when_required() {
        let p = Partition::new(0, 3).unwrap();
        assert!(p.range(10, true).is_err());
        assert_eq!(p.range(9, true).unwrap(), 0..3);
    }

    #[test]
    fn invalid_task_ids() {
        assert!(Partition::new(0, 0).is_err());
        assert!(Partition::new(3, 3).is_err());
        assert_eq!(Partition::single().range(7, true).unwrap(), 0..7);
    }
}
