use clap::Parser;

use vsc_rs::builder;
use vsc_rs::coerce::Operand;
use vsc_rs::domain::EnumDomain;
use vsc_rs::field::FieldType;
use vsc_rs::model::Model;
use vsc_rs::ops::Compare;
use vsc_rs::randomize::Randomizer;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of transactions to generate.
    #[arg(long, value_name = "INT", default_value = "10")]
    count: usize,

    /// Seed for reproducible stimulus.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Log solver activity.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Warn
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let kind = EnumDomain::new("Kind", [("READ", 0), ("WRITE", 1), ("IDLE", 3)])?;

    let mut model = Model::new("bus_txn");
    let op = model.field("op", FieldType::Enum(kind.clone()), true)?;
    let addr = model.field("addr", FieldType::unsigned(8), true)?;
    let len = model.field("len", FieldType::unsigned(4), true)?;
    let burst = model.field("burst", FieldType::unsigned(4), false)?;
    burst.set_value(4)?;

    // Word-aligned accesses in one of two windows.
    model.constraint_with("addr_map", |c| {
        c.add((&addr & 0b11).equals(0));
        c.try_add(builder::inside(
            &addr,
            [Operand::pair(0x10, 0x3f), Operand::pair(0xc0, 0xff)],
        )?)
    })?;
    model.constraint_with("len", |c| {
        c.add((&len).ge(1));
        c.add((&len).le(&burst));
        Ok(())
    })?;
    model.constraint_with("idle", |c| {
        c.add((&op).not_equals(kind.member("IDLE")?));
        Ok(())
    })?;

    let mut randomizer = match args.seed {
        Some(seed) => Randomizer::with_seed(seed),
        None => Randomizer::default(),
    };

    for i in 0..args.count {
        randomizer.randomize(&model)?;
        println!(
            "#{:<3} op = {:<12} addr = 0x{:02x}  len = {}",
            i,
            op.get_value().to_string(),
            addr.get_int(),
            len.get_int()
        );
    }

    // Allow idle cycles and force a single-beat access.
    model.set_constraint_mode("idle", false)?;
    let mut single = vsc_rs::scope::ConstraintScope::new();
    single.add((&len).equals(1));
    randomizer.randomize_with(&model, &single)?;
    println!(
        "idle allowed: op = {}, len = {}, solver has {} variables",
        op.get_value(),
        len.get_int(),
        randomizer.solver().num_vars()
    );

    Ok(())
}
