//! Priorities Example - static priorities with aging
//!
//! Three tasks with different priorities share the processor by yielding.
//! The most urgent one runs most often, but aging keeps the others from
//! starving.

use ppos::{ManualTicks, Runtime};

fn main() {
    let rt = match Runtime::builder().tick_source(ManualTicks).build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("runtime init failed: {:?}", err);
            return;
        }
    };

    for (name, prio) in [("Pang", -2), ("Peng", 0), ("Ping", 2)] {
        let spawned = rt.spawn(move |rt| {
            println!("{}: start (prio {:?})", name, rt.get_priority(None));
            for round in 0..5 {
                println!("{}: {}", name, round);
                rt.yield_now();
            }
            println!("{}: end", name);
            0
        });

        match spawned {
            Ok(id) => {
                if let Err(err) = rt.set_priority(Some(id), prio) {
                    eprintln!("set_priority failed: {:?}", err);
                }
            }
            Err(err) => eprintln!("spawn failed: {:?}", err),
        }
    }

    println!("main: start");
    if let Err(err) = rt.run() {
        eprintln!("run failed: {:?}", err);
    }
    println!("main: end");
}
