use std::path::PathBuf;

use sevash::{storage, FullDAG, LightDAG, Params};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // a poor man cli parser.
    let mut args = std::env::args().skip(1);

    let number: u64 = args
        .next()
        .map(|v| v.parse().unwrap_or_else(|_| print_help()))
        .unwrap_or_else(|| print_help());
    let dag_dir = match args.next().as_deref() {
        None => None,
        Some("--full") => Some(PathBuf::from(
            args.next().unwrap_or_else(|| print_help()),
        )),
        Some(_) => print_help(),
    };

    let params = Params::SEVASH;
    let epoch = params.epoch(number);
    println!("block {} is in epoch {}", number, epoch);
    println!("seed hash:    {:?}", sevash::seed_hash(number));
    let cache_size = params.cache_size(epoch).expect("epoch out of range");
    let full_size = params.dataset_size(epoch).expect("epoch out of range");
    println!("cache size:   {} MB", cache_size / (1024 * 1024));
    println!("dataset size: {} MB", full_size / (1024 * 1024));

    let Some(dir) = dag_dir else { return };

    let now = std::time::Instant::now();
    let light = LightDAG::with_params(number, params)
        .expect("failed to build the cache");
    println!(
        "Generated cache in {}",
        humantime::format_duration(now.elapsed())
    );

    let seed = light.seed_hash();
    let full = match storage::load(&dir, &seed, full_size)
        .expect("failed to read the DAG directory")
    {
        Some(dataset) => FullDAG::from_dataset(epoch, params, dataset)
            .expect("stored DAG does not match the epoch"),
        None => {
            let now = std::time::Instant::now();
            let mut report = |percent: u32| {
                if percent % 10 == 0 {
                    println!("dataset {}%", percent);
                }
                false
            };
            let full = FullDAG::new(&light, Some(&mut report))
                .expect("failed to generate the dataset");
            println!(
                "Generated Dataset in {}",
                humantime::format_duration(now.elapsed())
            );
            storage::save(&dir, &seed, &full.dataset)
                .expect("failed to save the dataset");
            full
        }
    };

    let header = sevash::H256::repeat_byte(0x42);
    let out = full.hashimoto(header, 0);
    assert_eq!(out, light.hashimoto(header, 0));
    println!("result {:?} mix {:?}", out.result, out.mix_hash);
}

fn print_help() -> ! {
    println!("usage: epoch <BLOCK_NUMBER> [--full <DAG_DIR>]");
    std::process::exit(1);
}
