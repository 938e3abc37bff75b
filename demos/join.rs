//! Join Example - waiting for tasks and collecting exit codes
//!
//! The main flow waits for each worker in turn, then exits itself; the
//! runtime ends the process once nothing is left to run.

use ppos::Runtime;

fn main() {
    let rt = match Runtime::init() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("runtime init failed: {:?}", err);
            return;
        }
    };

    let mut workers = Vec::new();
    for n in 0..5 {
        match rt.spawn(move |rt| {
            for step in 0..n {
                println!("task {}: step {}", rt.id(), step);
                rt.yield_now();
            }
            n * 10
        }) {
            Ok(id) => workers.push(id),
            Err(err) => eprintln!("spawn failed: {:?}", err),
        }
    }

    println!("main: start");
    for id in workers {
        match rt.wait(id) {
            Ok(code) => println!("main: task {} exited with {}", id, code),
            Err(err) => println!("main: wait on task {} failed: {:?}", id, err),
        }
    }
    println!("main: end");

    rt.exit(0)
}
