use argh::FromArgs;

use kornia_magick::{Kernel, KernelType, KernelView, MagickLibrary, NormalizeMode};

#[derive(FromArgs)]
/// Build a MagickCore morphology kernel and print its values
struct Args {
    /// built-in kernel name (e.g. Disk, Rectangle) or a full kernel string with --parse
    #[argh(positional)]
    kernel: String,

    /// kernel geometry, e.g. "5x3+1+1"
    #[argh(positional, default = "String::new()")]
    geometry: String,

    /// treat the kernel argument as a full kernel string such as "Ring:3,1"
    #[argh(switch)]
    parse: bool,

    /// scale factor applied to the kernel
    #[argh(option)]
    scale: Option<f64>,

    /// normalization used when scaling: none, value, correlate or percent
    #[argh(option, default = "NormalizeMode::None")]
    normalize: NormalizeMode,
}

fn print_kernel(index: usize, view: &KernelView) {
    let kernel_type = view
        .kernel_type()
        .map_or_else(|| "Unknown".to_string(), |kind| kind.to_string());
    let (x, y) = view.origin();
    println!(
        "Kernel #{index} \"{kernel_type}\" of size {}x{}{x:+}{y:+} with values from {} to {}",
        view.width(),
        view.height(),
        view.minimum(),
        view.maximum()
    );

    for row in view.to_array() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| {
                if v.is_nan() {
                    format!("{:>8}", "-")
                } else {
                    format!("{v:>8.3}")
                }
            })
            .collect();
        println!("{}", cells.join(" "));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let library = MagickLibrary::get()?;
    log::info!(
        "using {:?}, quantum range {}",
        library.loaded_from(),
        library.quantum_range()
    );

    let mut kernel = if args.parse {
        Kernel::parse(&args.kernel)?
    } else {
        let kernel_type: KernelType = args.kernel.parse()?;
        Kernel::acquire_builtin(kernel_type, &args.geometry)?
    };

    if let Some(factor) = args.scale {
        kernel.scale(factor, args.normalize)?;
    }

    for (index, view) in kernel.iter().enumerate() {
        print_kernel(index, &view);
    }

    Ok(())
}
