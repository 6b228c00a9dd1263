//! Reconstructs the longest causal chain ending at a run's terminal
//! (makespan) instance.

use crate::instance::TaskInstance;

/// Identify the terminal instance (max `end_ms` among non-delay instances,
/// ties broken by highest `id`), then walk parents — preferring
/// `parent_task_instance_id`, falling back to
/// `capacity_parent_instance_id` — until neither is set. Returns the
/// walked names, in causal (earliest-first) order, joined with `>`.
pub fn critical_path(instances: &[TaskInstance]) -> String {
    let terminal = instances
        .iter()
        .filter(|i| !i.synthetic)
        .max_by(|a, b| {
            a.end_ms
                .partial_cmp(&b.end_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

    let Some(terminal) = terminal else {
        return String::new();
    };

    let by_id: std::collections::HashMap<u64, &TaskInstance> =
        instances.iter().map(|i| (i.id, i)).collect();

    let mut chain = vec![terminal.task_name.as_str()];
    let mut current = terminal;
    loop {
        let next_id = current
            .parent_task_instance_id
            .or(current.capacity_parent_instance_id);
        let Some(next_id) = next_id else {
            break;
        };
        let Some(next) = by_id.get(&next_id) else {
            break;
        };
        chain.push(next.task_name.as_str());
        current = next;
    }

    chain.reverse();
    chain.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(
        id: u64,
        name: &str,
        end_ms: f64,
        parent: Option<u64>,
        capacity_parent: Option<u64>,
    ) -> TaskInstance {
        TaskInstance {
            id,
            task_name: name.to_string(),
            context: "c".to_string(),
            enqueue_ms: 0.0,
            start_ms: 0.0,
            end_ms,
            parent_task_instance_id: parent,
            capacity_parent_instance_id: capacity_parent,
            synthetic: false,
        }
    }

    #[test]
    fn single_instance_is_its_own_path() {
        let instances = vec![inst(0, "t1", 10.0, None, None)];
        assert_eq!(critical_path(&instances), "t1");
    }

    #[test]
    fn prefers_causal_parent_over_capacity_parent() {
        // t2 both emitted-from t1 AND admitted onto a slot freed by t1; the
        // causal link wins.
        let instances = vec![
            inst(0, "t1", 10.0, None, None),
            inst(1, "t2", 20.0, Some(0), Some(0)),
        ];
        assert_eq!(critical_path(&instances), "t1>t2");
    }

    #[test]
    fn falls_back_to_capacity_parent_when_no_causal_parent() {
        // t2 was not emitted by t1, only queued behind it on a shared
        // context.
        let instances = vec![
            inst(0, "t1", 10.0, None, None),
            inst(1, "t2", 20.0, None, Some(0)),
        ];
        assert_eq!(critical_path(&instances), "t1>t2");
    }

    #[test]
    fn ties_in_end_ms_broken_by_highest_id() {
        let instances = vec![
            inst(0, "a", 10.0, None, None),
            inst(1, "b", 10.0, None, None),
        ];
        assert_eq!(critical_path(&instances), "b");
    }

    #[test]
    fn synthetic_delay_names_appear_inline() {
        let mut delay = inst(1, "delay(e->t2)", 15.0, Some(0), None);
        delay.synthetic = true;
        let instances = vec![inst(0, "t1", 10.0, None, None), delay, inst(2, "t2", 20.0, Some(1), None)];
        assert_eq!(critical_path(&instances), "t1>delay(e->t2)>t2");
    }
}
