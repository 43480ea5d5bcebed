//! Per-operation latency profile for the keyed queue.
//!
//! Records enqueue and dequeue latency in cycles for each lock backend,
//! once uncontended and once with a second thread hammering the same queue.
//!
//! For stable numbers, disable turbo boost and pin to physical cores:
//!   echo 1 | sudo tee /sys/devices/system/cpu/intel_pstate/no_turbo
//!   sudo taskset -c 0,2 ./target/release/deps/profile_keyed-*

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use nexus_keyed::{BlockingLock, Item, Key, KeyedQueue, Lock, QueueBuilder, SpinLock};

const WARMUP: u32 = 100_000;
const SAMPLES: u32 = 1_000_000;
const PAYLOAD: [u8; 32] = [0x5A; 32];

#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtscp() -> u64 {
    unsafe {
        let mut aux: u32 = 0;
        core::arch::x86_64::__rdtscp(&mut aux)
    }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn rdtscp() -> u64 {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

fn estimate_cpu_freq_ghz() -> f64 {
    let start_cycles = rdtscp();
    let start_time = Instant::now();
    thread::sleep(Duration::from_millis(10));
    let end_cycles = rdtscp();
    let elapsed = start_time.elapsed();
    end_cycles.wrapping_sub(start_cycles) as f64 / elapsed.as_nanos() as f64
}

fn scrambled(i: u32) -> Key {
    i.wrapping_mul(0x9E37_79B9)
}

struct Profile {
    enqueue: Histogram<u64>,
    dequeue: Histogram<u64>,
}

fn sample<L: Lock>(queue: &KeyedQueue<L>, profile: &mut Profile, i: u32) {
    let item = Item::new(scrambled(i), PAYLOAD);

    let start = rdtscp();
    let _ = queue.enqueue(&item);
    let elapsed = rdtscp().wrapping_sub(start);
    let _ = profile.enqueue.record(elapsed.min(1_000_000));

    let start = rdtscp();
    let out = queue.dequeue();
    let elapsed = rdtscp().wrapping_sub(start);
    let _ = profile.dequeue.record(elapsed.min(1_000_000));

    std::hint::black_box(out);
}

fn profile<L: Lock + Sync>(contended: bool) -> Profile {
    let queue: KeyedQueue<L> = QueueBuilder::default().build().unwrap();
    // Standing backlog so dequeue walks a realistic tree
    for i in 0..1_000 {
        queue.enqueue(&Item::new(scrambled(u32::MAX - i), PAYLOAD)).unwrap();
    }

    let mut profile = Profile {
        enqueue: Histogram::new_with_max(1_000_000, 3).unwrap(),
        dequeue: Histogram::new_with_max(1_000_000, 3).unwrap(),
    };
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        if contended {
            let queue = &queue;
            let stop = &stop;
            s.spawn(move || {
                let mut i = 0u32;
                while !stop.load(Ordering::Relaxed) {
                    // Keys disjoint from the sampling thread
                    let _ = queue.enqueue(&Item::new(scrambled(1 << 31 | (i & 0xFFFF)), PAYLOAD));
                    std::hint::black_box(queue.dequeue());
                    i = i.wrapping_add(1);
                }
            });
        }

        let mut warm = Profile {
            enqueue: Histogram::new_with_max(1_000_000, 3).unwrap(),
            dequeue: Histogram::new_with_max(1_000_000, 3).unwrap(),
        };
        for i in 0..WARMUP {
            sample(&queue, &mut warm, i);
        }
        for i in 0..SAMPLES {
            sample(&queue, &mut profile, WARMUP + i);
        }

        stop.store(true, Ordering::Relaxed);
    });

    profile
}

fn print_histogram(name: &str, hist: &Histogram<u64>, cpu_ghz: f64) {
    println!("{}:", name);
    println!(
        "    p50: {:>6} cyc {:>8.1} ns",
        hist.value_at_quantile(0.50),
        hist.value_at_quantile(0.50) as f64 / cpu_ghz
    );
    println!(
        "    p99: {:>6} cyc {:>8.1} ns",
        hist.value_at_quantile(0.99),
        hist.value_at_quantile(0.99) as f64 / cpu_ghz
    );
    println!(
        "   p999: {:>6} cyc {:>8.1} ns",
        hist.value_at_quantile(0.999),
        hist.value_at_quantile(0.999) as f64 / cpu_ghz
    );
    println!(
        "    max: {:>6} cyc {:>8.1} ns",
        hist.max(),
        hist.max() as f64 / cpu_ghz
    );
}

fn report(name: &str, profile: &Profile, cpu_ghz: f64) {
    print_histogram(&format!("{name} enqueue"), &profile.enqueue, cpu_ghz);
    print_histogram(&format!("{name} dequeue"), &profile.dequeue, cpu_ghz);
    println!();
}

fn main() {
    println!("nexus-keyed Latency Profile");
    println!("===========================");
    println!();
    println!("Warmup:  {}", WARMUP);
    println!("Samples: {}", SAMPLES);
    println!();

    let cpu_ghz = estimate_cpu_freq_ghz();
    println!("Estimated CPU freq: {:.2} GHz", cpu_ghz);
    println!();

    for contended in [false, true] {
        println!(
            "=== {} ===",
            if contended { "Contended (2 threads)" } else { "Uncontended" }
        );
        println!();

        report("spin", &profile::<SpinLock>(contended), cpu_ghz);
        report("blocking", &profile::<BlockingLock>(contended), cpu_ghz);
        #[cfg(all(feature = "futex", target_os = "linux"))]
        report("futex", &profile::<nexus_keyed::FutexLock>(contended), cpu_ghz);
    }
}
