use std::future::Future;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use super::types::ExecutionResult;

/// Run one layer: every task future is polled concurrently and the layer
/// completes only when all of them have.
///
/// # Arguments
///
/// * `indices` - Task positions in the submitted task set
/// * `run_task` - Produces the future for one task position
///
/// # Returns
///
/// `(index, result)` pairs in completion order
pub async fn execute_layer<F, Fut>(indices: &[usize], run_task: F) -> Vec<(usize, ExecutionResult)>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = ExecutionResult>,
{
    let mut futs: FuturesUnordered<_> = indices
        .iter()
        .map(|&idx| {
            let fut = run_task(idx);
            async move { (idx, fut.await) }
        })
        .collect();

    let mut results = Vec::with_capacity(indices.len());
    while let Some(done) = futs.next().await {
        results.push(done);
    }
    results
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn layer_members_run_concurrently() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let started = std::time::Instant::now();
        let results = execute_layer(&[0, 1, 2], |idx| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                ExecutionResult {
                    task_id: format!("t{idx}"),
                    ..Default::default()
                }
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() < Duration::from_millis(290));

        let mut idx: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        idx.sort();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn empty_layer_is_a_no_op() {
        let results = execute_layer(&[], |_| async { ExecutionResult::default() }).await;
        assert!(results.is_empty());
    }
}
