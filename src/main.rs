use vperf::cli::CliArgs;
use vperf::drivers;
use vperf::kernels::KernelId;
use vperf::memory::DeviceSpace;
use vperf::report::{self, PerfReport};
use vperf::variant::VariantId;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use std::fs::OpenOptions;
use std::io::{stdout, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let kernels = args.kernels.clone().unwrap_or_else(|| KernelId::ALL.to_vec());
    let variants = args.variants.clone().unwrap_or_else(|| VariantId::ALL.to_vec());
    let space = DeviceSpace::with_capacity(args.device_capacity);

    let mut rows = Vec::new();
    let mut fatal = false;
    for kid in kernels {
        let mut kernel = kid.construct(args.size_class);
        if let Some(samples) = args.samples {
            kernel.dimensions_mut().sample_count = samples;
        }
        if let Some(reps) = args.reps {
            kernel.dimensions_mut().run_reps = reps;
        }

        let summary = drivers::run_kernel(kernel.as_mut(), &variants, &space);
        let failure = summary.fatal.is_some();
        if let Some(err) = &summary.fatal {
            tracing::error!(kernel = summary.kernel, error = %err, "aborting run");
        }
        rows.extend(report::reports_for(kernel.as_ref(), &summary, args.tolerance));
        if failure {
            fatal = true;
            break;
        }
    }

    let mut output: Box<dyn Write> = match args.output_file {
        Some(ref name) => Box::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(name)
                .expect("Failed to open output file"),
        ),
        None => Box::new(stdout()),
    };

    PerfReport::print_csv_header(&mut output).expect("Failed to write report's CSV header");
    for row in rows {
        writeln!(output, "{row}").expect("Failed to write report");
    }

    if fatal {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
