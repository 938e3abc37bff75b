//! Preemption Example - time slicing under a host tick thread
//!
//! Workers never yield; they only hit preemption checkpoints. The tick
//! thread fills their quanta and the runtime rotates them.

use std::time::{Duration, Instant};

use ppos::Runtime;

fn main() {
    let rt = match Runtime::builder().tick_interval(Duration::from_millis(1)).build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("runtime init failed: {:?}", err);
            return;
        }
    };

    for name in ["Alpha", "Beta", "Gamma"] {
        let spawned = rt.spawn(move |rt| {
            let mut last = u64::MAX;
            let started = Instant::now();
            while started.elapsed() < Duration::from_millis(200) {
                rt.checkpoint();
                let now = rt.now();
                if now / 20 != last / 20 {
                    println!("{}: running at tick {}", name, now);
                }
                last = now;
            }
            0
        });
        if let Err(err) = spawned {
            eprintln!("spawn failed: {:?}", err);
        }
    }

    if let Err(err) = rt.run() {
        eprintln!("run failed: {:?}", err);
    }
    println!("main: done after {} ticks", rt.now());
}
