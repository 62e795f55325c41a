use std::env;
use std::time::Duration;

use procsync::unit::{self, Unit};
use procsync::{channel, PoolConfig, SharedRegister, SharedSequence, WorkQueue, WorkerPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type GenericError = Box<dyn std::error::Error + Send + Sync>;

const WORKERS_VAR: &str = "PROCSYNC_WORKERS";

fn pool_config() -> Result<PoolConfig, GenericError> {
    let config = PoolConfig::default().with_name("demo");
    match env::var(WORKERS_VAR) {
        Ok(workers) => Ok(config.with_workers(workers.parse()?)),
        Err(env::VarError::NotPresent) => Ok(config),
        Err(err) => Err(err.into()),
    }
}

/// Joins every unit before reporting the first failure, so that none is left
/// running detached.
fn join_all<T>(units: impl IntoIterator<Item = Unit<T>>) -> procsync::Result<Vec<T>> {
    let joined: Vec<_> = units.into_iter().map(Unit::join).collect();
    joined.into_iter().collect()
}

fn interleaved_counters() -> procsync::Result<()> {
    let units: Vec<_> = ["process1", "process2"]
        .into_iter()
        .map(|name| {
            unit::spawn(name, move || {
                for i in 0..3 {
                    std::thread::sleep(Duration::from_millis(10));
                    info!(unit = name, number = i, "counting");
                }
            })
        })
        .collect();
    join_all(units)?;
    Ok(())
}

fn squared_array_with_sum() -> procsync::Result<()> {
    let values = SharedSequence::new(1..=4_i32);
    let sum = SharedRegister::new(0);

    let squarer = {
        let values = values.clone();
        let sum = sum.clone();
        unit::spawn("squarer", move || -> procsync::Result<()> {
            for index in 0..values.len() {
                let value = values.get(index)?;
                values.set(index, value * value)?;
                sum.apply(value * value);
            }
            Ok(())
        })
    };
    squarer.join()??;

    info!(array = ?values.to_vec(), sum = sum.read(), "squared shared array");
    Ok(())
}

fn pipe_until_sentinel() -> procsync::Result<()> {
    let (parent, mut child) = channel::pipe::<String>();

    let sender = unit::spawn("sender", move || -> procsync::Result<()> {
        for msg in ["Hello", "How are you", "Good, thanks"] {
            parent.send(&msg.to_owned())?;
            info!(%msg, "sent");
        }
        parent.finish()
    });
    let receiver = unit::spawn("receiver", move || -> procsync::Result<usize> {
        let mut count = 0;
        for msg in child.iter() {
            let msg = msg?;
            info!(%msg, "received");
            count += 1;
        }
        Ok(count)
    });

    let (sent, received) = (sender.join(), receiver.join());
    sent??;
    let count = received??;
    info!(count, "stream ended");
    Ok(())
}

fn queue_producer_consumer() -> procsync::Result<()> {
    let queue = WorkQueue::new();

    let producer = {
        let queue = queue.clone();
        unit::spawn("producer", move || -> procsync::Result<()> {
            for item in 0..5 {
                queue.enqueue(item)?;
                info!(item, "produced");
            }
            queue.close();
            Ok(())
        })
    };
    let consumer = {
        let queue = queue.clone();
        unit::spawn("consumer", move || {
            while let Ok(item) = queue.dequeue_blocking() {
                info!(item, "consumed");
            }
        })
    };

    let (produced, consumed) = (producer.join(), consumer.join());
    produced??;
    consumed?;
    info!("queue processing complete");
    Ok(())
}

fn pool_squares(config: PoolConfig) -> procsync::Result<()> {
    let pool = WorkerPool::with_config(config)?;
    let squares = pool.map(|x: u64| x * x, [1, 2, 3, 4])?;
    info!(workers = pool.workers(), ?squares, "squared numbers");
    Ok(())
}

fn deposit_and_withdraw() -> procsync::Result<()> {
    let balance = SharedRegister::new(10_000);

    let deposits = {
        let balance = balance.clone();
        unit::spawn("deposit", move || {
            for _ in 0..500 {
                balance.apply(10);
            }
        })
    };
    let withdrawals = {
        let balance = balance.clone();
        unit::spawn("withdraw", move || {
            for _ in 0..500 {
                balance.apply(-5);
            }
        })
    };
    let (deposited, withdrawn) = (deposits.join(), withdrawals.join());
    deposited?;
    withdrawn?;

    info!(balance = balance.read(), "final balance");
    Ok(())
}

fn shared_list_squared_by_two_units() -> procsync::Result<()> {
    let records = SharedSequence::new(2..=5_i32);

    let units: Vec<_> = records
        .partition(2)
        .into_iter()
        .enumerate()
        .map(|(i, range)| {
            let records = records.clone();
            unit::spawn(format!("squarer-{i}"), move || -> procsync::Result<()> {
                for index in range {
                    records.map_in_place(index..index + 1, |record| record * record)?;
                    info!(index, records = ?records.to_vec(), "modified record");
                }
                Ok(())
            })
        })
        .collect();
    for squared in join_all(units)? {
        squared?;
    }

    info!(records = ?records.to_vec(), "final list");
    Ok(())
}

fn main() -> Result<(), GenericError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = pool_config()?;

    let scenarios: [(&str, Box<dyn FnOnce() -> procsync::Result<()>>); 7] = [
        ("interleaved counters", Box::new(interleaved_counters)),
        ("squared array", Box::new(squared_array_with_sum)),
        ("pipe", Box::new(pipe_until_sentinel)),
        ("queue", Box::new(queue_producer_consumer)),
        ("pool", Box::new(move || pool_squares(config))),
        ("deposit and withdraw", Box::new(deposit_and_withdraw)),
        ("shared list", Box::new(shared_list_squared_by_two_units)),
    ];

    let mut failures = 0;
    for (name, scenario) in scenarios {
        info!(scenario = name, "starting");
        if let Err(err) = scenario() {
            warn!(scenario = name, %err, "scenario failed");
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} scenario(s) failed").into());
    }
    Ok(())
}
