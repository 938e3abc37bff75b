//! Unit tests for core runtime modules
//!
//! These tests exercise the queue and scheduler on plain node tables,
//! without switching contexts.

#[cfg(test)]
mod common {
    use ppos::queue::{Linked, Links};
    use ppos::sched::SchedEntity;
    use ppos::types::Priority;

    #[derive(Debug, Default)]
    pub struct Node {
        links: Links,
        static_prio: Priority,
        dynamic_prio: Priority,
    }

    impl Node {
        pub fn with_prio(prio: Priority) -> Self {
            Node {
                links: Links::new(),
                static_prio: prio,
                dynamic_prio: prio,
            }
        }
    }

    impl Linked for Node {
        fn links(&self) -> &Links {
            &self.links
        }

        fn links_mut(&mut self) -> &mut Links {
            &mut self.links
        }
    }

    impl SchedEntity for Node {
        fn static_prio(&self) -> Priority {
            self.static_prio
        }

        fn dynamic_prio(&self) -> Priority {
            self.dynamic_prio
        }

        fn set_dynamic_prio(&mut self, prio: Priority) {
            self.dynamic_prio = prio;
        }
    }

    pub fn nodes(count: usize) -> Vec<Node> {
        (0..count).map(|_| Node::default()).collect()
    }
}

#[cfg(test)]
mod queue_tests {
    use super::common::nodes;
    use ppos::error::QueueError;
    use ppos::queue::{Linked, Ring};

    #[test]
    fn test_empty_ring() {
        let ring = Ring::new();
        let table = nodes(2);
        assert!(ring.is_empty());
        assert_eq!(ring.head(), None);
        assert_eq!(ring.size(&table), 0);
        assert!(!ring.contains(&table, 0));
    }

    #[test]
    fn test_first_append_is_self_cycle() {
        let mut ring = Ring::new();
        let mut table = nodes(3);

        ring.append(&mut table, 1).unwrap();

        assert_eq!(ring.head(), Some(1));
        assert_eq!(table[1].links().next(), Some(1));
        assert_eq!(table[1].links().prev(), Some(1));
        assert_eq!(ring.size(&table), 1);
    }

    #[test]
    fn test_append_keeps_fifo_order() {
        let mut ring = Ring::new();
        let mut table = nodes(5);

        for idx in [3, 0, 4, 1] {
            ring.append(&mut table, idx).unwrap();
        }

        assert_eq!(ring.iter(&table).collect::<Vec<_>>(), vec![3, 0, 4, 1]);
        assert_eq!(ring.size(&table), 4);
        // Tail sits just before the head
        assert_eq!(table[3].links().prev(), Some(1));
        assert_eq!(table[1].links().next(), Some(3));
    }

    #[test]
    fn test_append_rejects_members() {
        let mut ready = Ring::new();
        let mut other = Ring::new();
        let mut table = nodes(2);

        ready.append(&mut table, 0).unwrap();

        assert_eq!(ready.append(&mut table, 0), Err(QueueError::AlreadyMember));
        assert_eq!(other.append(&mut table, 0), Err(QueueError::AlreadyMember));
        assert_eq!(ready.size(&table), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn test_append_out_of_range() {
        let mut ring = Ring::new();
        let mut table = nodes(2);
        assert_eq!(ring.append(&mut table, 2), Err(QueueError::NullElem));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_remove_single_node() {
        let mut ring = Ring::new();
        let mut table = nodes(2);

        ring.append(&mut table, 0).unwrap();
        assert_eq!(ring.remove(&mut table, 1), Err(QueueError::NotFound));

        ring.remove(&mut table, 0).unwrap();
        assert!(ring.is_empty());
        assert!(!table[0].links().is_linked());
    }

    #[test]
    fn test_remove_head_advances() {
        let mut ring = Ring::new();
        let mut table = nodes(3);
        for idx in 0..3 {
            ring.append(&mut table, idx).unwrap();
        }

        ring.remove(&mut table, 0).unwrap();

        assert_eq!(ring.head(), Some(1));
        assert_eq!(ring.iter(&table).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(table[0].links().next(), None);
        assert_eq!(table[0].links().prev(), None);
    }

    #[test]
    fn test_remove_interior() {
        let mut ring = Ring::new();
        let mut table = nodes(4);
        for idx in 0..4 {
            ring.append(&mut table, idx).unwrap();
        }

        ring.remove(&mut table, 2).unwrap();

        assert_eq!(ring.head(), Some(0));
        assert_eq!(ring.iter(&table).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(table[1].links().next(), Some(3));
        assert_eq!(table[3].links().prev(), Some(1));

        // A removed node can join again
        ring.append(&mut table, 2).unwrap();
        assert_eq!(ring.iter(&table).collect::<Vec<_>>(), vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_remove_errors() {
        let mut ring = Ring::new();
        let mut other = Ring::new();
        let mut table = nodes(4);

        assert_eq!(ring.remove(&mut table, 0), Err(QueueError::EmptyQueue));

        ring.append(&mut table, 0).unwrap();
        ring.append(&mut table, 1).unwrap();
        other.append(&mut table, 2).unwrap();

        assert_eq!(ring.remove(&mut table, 9), Err(QueueError::NullElem));
        assert_eq!(ring.remove(&mut table, 3), Err(QueueError::NotFound));
        // Linked, but into another ring
        assert_eq!(ring.remove(&mut table, 2), Err(QueueError::NotFound));
        assert_eq!(ring.size(&table), 2);
        assert!(other.contains(&table, 2));
    }

    #[test]
    fn test_pop_front_drains_in_order() {
        let mut ring = Ring::new();
        let mut table = nodes(3);
        for idx in [2, 0, 1] {
            ring.append(&mut table, idx).unwrap();
        }

        assert_eq!(ring.pop_front(&mut table), Some(2));
        assert_eq!(ring.pop_front(&mut table), Some(0));
        assert_eq!(ring.pop_front(&mut table), Some(1));
        assert_eq!(ring.pop_front(&mut table), None);
        assert!(table.iter().all(|node| !node.links().is_linked()));
    }

    #[test]
    fn test_mixed_append_remove_tracks_order() {
        let mut ring = Ring::new();
        let mut table = nodes(8);
        let mut expected: Vec<usize> = Vec::new();
        let mut seed: u32 = 0x2545_f491;

        for step in 0..500 {
            // xorshift32
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let idx = seed as usize % table.len();

            if let Some(pos) = expected.iter().position(|&queued| queued == idx) {
                ring.remove(&mut table, idx).unwrap();
                expected.remove(pos);
            } else {
                ring.append(&mut table, idx).unwrap();
                expected.push(idx);
            }

            assert_eq!(ring.size(&table), expected.len(), "step {}", step);
            assert_eq!(ring.iter(&table).collect::<Vec<_>>(), expected, "step {}", step);
            for (node, links) in table.iter().map(|n| n.links()).enumerate() {
                assert_eq!(links.is_linked(), expected.contains(&node), "step {}", step);
            }
        }
    }
}

#[cfg(test)]
mod sched_tests {
    use super::common::{Node, nodes};
    use ppos::queue::Ring;
    use ppos::sched::{pick, SchedEntity};

    fn ring_of(table: &mut [Node]) -> Ring {
        let mut ring = Ring::new();
        for idx in 0..table.len() {
            ring.append(table, idx).unwrap();
        }
        ring
    }

    #[test]
    fn test_pick_empty() {
        let mut table = nodes(2);
        assert_eq!(pick(&Ring::new(), &mut table), None);
    }

    #[test]
    fn test_pick_lowest_value_first() {
        let mut table: Vec<Node> = [0, 3, -2, 1].into_iter().map(Node::with_prio).collect();
        let ring = ring_of(&mut table);

        assert_eq!(pick(&ring, &mut table), Some(2));
        // Membership is left to the caller
        assert_eq!(ring.size(&table), 4);
    }

    #[test]
    fn test_pick_ages_the_rest() {
        let mut table: Vec<Node> = [0, -3, 4].into_iter().map(Node::with_prio).collect();
        let ring = ring_of(&mut table);

        assert_eq!(pick(&ring, &mut table), Some(1));

        assert_eq!(table[0].dynamic_prio(), -1);
        assert_eq!(table[1].dynamic_prio(), -3);
        assert_eq!(table[2].dynamic_prio(), 3);
    }

    #[test]
    fn test_pick_ties_go_to_queue_order() {
        let mut table: Vec<Node> = [2, 0, 0, 0].into_iter().map(Node::with_prio).collect();
        let mut ring = Ring::new();
        for idx in [0, 3, 1, 2] {
            ring.append(&mut table, idx).unwrap();
        }

        assert_eq!(pick(&ring, &mut table), Some(3));
    }

    #[test]
    fn test_pick_priority_scenario() {
        // A(-5), B(0), C(5)
        let mut table: Vec<Node> = [-5, 0, 5].into_iter().map(Node::with_prio).collect();
        let mut ring = ring_of(&mut table);

        assert_eq!(pick(&ring, &mut table), Some(0));
        ring.remove(&mut table, 0).unwrap();

        assert_eq!(pick(&ring, &mut table), Some(1));
        ring.remove(&mut table, 1).unwrap();

        assert_eq!(pick(&ring, &mut table), Some(2));
    }

    #[test]
    fn test_aging_converges() {
        let mut table: Vec<Node> = [0, 3].into_iter().map(Node::with_prio).collect();
        let ring = ring_of(&mut table);

        let mut last = table[1].dynamic_prio();
        let mut rounds = 0;
        loop {
            rounds += 1;
            assert!(rounds < 16, "low priority task starved");

            if pick(&ring, &mut table) == Some(1) {
                break;
            }
            assert!(table[1].dynamic_prio() < last);
            last = table[1].dynamic_prio();
        }

        assert_eq!(table[1].dynamic_prio(), table[1].static_prio());
    }

    #[test]
    fn test_fairness_without_requeue() {
        for count in 1..=6 {
            let mut table = nodes(count);
            let ring = ring_of(&mut table);

            let mut seen = vec![false; count];
            for _ in 0..count {
                let idx = pick(&ring, &mut table).unwrap();
                seen[idx] = true;
            }
            assert!(seen.iter().all(|s| *s), "unfair with {} tasks: {:?}", count, seen);
        }
    }

    #[test]
    fn test_fairness_with_requeue() {
        let count = 5;
        let mut table = nodes(count);
        let mut ring = ring_of(&mut table);

        let mut order = Vec::new();
        for _ in 0..count {
            let idx = pick(&ring, &mut table).unwrap();
            ring.remove(&mut table, idx).unwrap();
            ring.append(&mut table, idx).unwrap();
            order.push(idx);
        }

        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}

#[cfg(test)]
mod stack_tests {
    use ppos::config::{CFG_STACK_ALIGN, CFG_STACK_SIZE, CFG_STACK_SIZE_MIN};
    use ppos::error::OsError;
    use ppos::stack::Stack;

    #[test]
    fn test_stack_too_small() {
        assert_eq!(Stack::new(CFG_STACK_SIZE_MIN - 1).err(), Some(OsError::StkSizeInvalid));
        assert_eq!(Stack::new(0).err(), Some(OsError::StkSizeInvalid));
    }

    #[test]
    fn test_stack_bounds() {
        let stack = Stack::new(CFG_STACK_SIZE).unwrap();
        assert_eq!(stack.size(), CFG_STACK_SIZE);
        assert_eq!(stack.top() as usize - stack.base() as usize, CFG_STACK_SIZE);
        assert_eq!(stack.base() as usize % CFG_STACK_ALIGN, 0);
    }
}

#[cfg(test)]
mod error_tests {
    use ppos::error::{OsError, QueueError};

    #[test]
    fn test_queue_error_codes() {
        assert_eq!(QueueError::NullQueue as u16, 1001);
        assert_eq!(QueueError::NullElem as u16, 1002);
        assert_eq!(QueueError::AlreadyMember as u16, 1003);
        assert_eq!(QueueError::EmptyQueue as u16, 1004);
        assert_eq!(QueueError::NotFound as u16, 1005);
    }

    #[test]
    fn test_queue_error_conversion() {
        fn remove() -> Result<(), OsError> {
            Err(QueueError::NotFound)?;
            Ok(())
        }

        assert_eq!(remove(), Err(OsError::Queue(QueueError::NotFound)));
    }

    #[test]
    fn test_structural_errors() {
        assert!(OsError::Queue(QueueError::AlreadyMember).is_structural());
        assert!(OsError::Queue(QueueError::EmptyQueue).is_structural());
        assert!(!OsError::Queue(QueueError::NotFound).is_structural());
        assert!(!OsError::TaskTerminated.is_structural());
    }

    #[test]
    fn test_error_debug() {
        let err = OsError::Deadlock;
        let _ = format!("{:?}", err);
    }
}

#[cfg(test)]
mod types_tests {
    use ppos::types::*;

    #[test]
    fn test_reserved_ids() {
        assert_eq!(TaskId::BOOTSTRAP.as_u32(), 0);
        assert_eq!(TaskId::DISPATCHER.as_u32(), 1);
        assert_eq!(format!("{}", TaskId::DISPATCHER), "1");
    }

    #[test]
    fn test_task_state_enum() {
        assert_eq!(TaskState::Ready as u8, 0);
        assert_eq!(TaskState::Terminated as u8, 3);
        assert_ne!(TaskState::Running, TaskState::Suspended);
    }
}

#[cfg(test)]
mod config_tests {
    use core::time::Duration;
    use ppos::config::*;

    #[test]
    fn test_config_values() {
        assert!(CFG_STACK_SIZE >= CFG_STACK_SIZE_MIN);
        assert_eq!(CFG_STACK_ALIGN, 16);
        assert_eq!(CFG_QUANTUM_TICKS, 20);
        assert_eq!(CFG_PRIO_DEFAULT, 0);
    }

    #[test]
    fn test_runtime_config_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.stack_size, CFG_STACK_SIZE);
        assert_eq!(config.quantum, CFG_QUANTUM_TICKS);
        assert_eq!(config.tick_interval, Duration::from_micros(CFG_TICK_INTERVAL_US));
    }
}
