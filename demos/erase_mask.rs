//! Punch a transparent hole into an image using a white-on-black mask.
//!
//! Usage:
//! ```sh
//! cargo run --example erase_mask -- photo.jpg mask.png photo_erased.png
//! ```

use std::env;
use std::path::Path;
use std::process;

use canvas_compositor::{Compositor, Operation};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <input> <mask> <output>", args[0]);
        process::exit(1);
    }

    let op = Operation::EraseMask {
        mask: args[2].clone().into(),
    };
    let result = Compositor::new().process_file(Path::new(&args[1]), Path::new(&args[3]), &op);

    if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
