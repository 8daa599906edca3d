// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crystal_editor::crystolecule::crystal::Crystal;
use crystal_editor::crystolecule::io::poscar::{load_poscar, write_poscar};
use crystal_editor::crystolecule::model::Model;
use crystal_editor::crystolecule::slab::{generate_slab, SlabParameters};
use crystal_editor::editor::settings::EditorSettings;
use crystal_editor::util::imat3::IMat3;
use glam::i32::IVec3;
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "crystal-editor",
    about = "Inspect and transform crystal structures in POSCAR files",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of the cell and its contents
    Info {
        /// POSCAR file
        input: PathBuf,

        /// Print the structure snapshot as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Wrap every atom into the unit cell
    Wrap(TransformArgs),

    /// Build a supercell from an integer matrix
    Supercell {
        #[command(flatten)]
        io: TransformArgs,

        /// Either three repeat counts (na,nb,nc) or nine matrix entries, row by row
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        matrix: Vec<i32>,
    },

    /// Cut a surface slab
    Slab {
        #[command(flatten)]
        io: TransformArgs,

        /// Miller indices h,k,l
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        miller: Vec<i32>,

        /// Number of atomic layers (settings default if omitted)
        #[arg(long)]
        layers: Option<usize>,

        /// Vacuum thickness in Å (settings default if omitted)
        #[arg(long)]
        vacuum: Option<f64>,

        /// Put half of the vacuum below the slab
        #[arg(long)]
        centered: bool,
    },

    /// Infer bonds through periodic images and print how many were found
    Autobond {
        /// POSCAR file
        input: PathBuf,

        /// Multiplier on the covalent radius sum (settings default if omitted)
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[derive(Args)]
struct TransformArgs {
    /// POSCAR file
    input: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init(&[env!("CARGO_PKG_NAME"), "crystal_editor"]);

    let cli = Cli::parse();
    let settings = EditorSettings::load();

    match cli.command {
        Command::Info { input, json } => {
            let crystal = load(&input)?;
            if json {
                println!("{}", Model::Crystal(crystal).to_snapshot().to_json()?);
            } else {
                print_info(&crystal)?;
            }
        }
        Command::Wrap(io) => {
            let mut crystal = load(&io.input)?;
            crystal.wrap_atoms()?;
            emit(&crystal, &io)?;
        }
        Command::Supercell { io, matrix } => {
            let matrix = match matrix.as_slice() {
                [na, nb, nc] => IMat3::diagonal(*na, *nb, *nc),
                [a0, a1, a2, b0, b1, b2, c0, c1, c2] => {
                    IMat3::from_rows([[*a0, *a1, *a2], [*b0, *b1, *b2], [*c0, *c1, *c2]])
                }
                _ => bail!("--matrix takes 3 or 9 integers, got {}", matrix.len()),
            };
            let crystal = load(&io.input)?;
            let supercell = crystal.generate_supercell_matrix(&matrix)?;
            emit(&supercell, &io)?;
        }
        Command::Slab {
            io,
            miller,
            layers,
            vacuum,
            centered,
        } => {
            let [h, k, l] = miller.as_slice() else {
                bail!("--miller takes 3 integers, got {}", miller.len());
            };
            let params = SlabParameters {
                miller: IVec3::new(*h, *k, *l),
                layers: layers.unwrap_or(settings.slab_layers),
                vacuum: vacuum.unwrap_or(settings.slab_vacuum),
                centered,
            };
            let crystal = load(&io.input)?;
            let slab = generate_slab(&crystal, &params)?;
            eprintln!(
                "d-spacing {:.6} Å, {} layers, {} atoms",
                slab.info.d_spacing, slab.info.layers, slab.info.atom_count
            );
            emit(&slab.crystal, &io)?;
        }
        Command::Autobond { input, threshold } => {
            let mut model = Model::Crystal(load(&input)?);
            let count = model.auto_bond(threshold.unwrap_or(settings.bond_threshold))?;
            println!("{}", count);
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<Crystal> {
    let crystal = load_poscar(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!("{}", crystal.structure().to_detailed_string());
    Ok(crystal)
}

fn emit(crystal: &Crystal, io: &TransformArgs) -> Result<()> {
    let text = write_poscar(crystal)?;
    match &io.output {
        Some(path) => fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

fn print_info(crystal: &Crystal) -> Result<()> {
    let lattice = crystal.require_lattice()?;
    let p = lattice.parameters();
    println!("name:        {}", crystal.name());
    println!(
        "cell:        a={:.4} b={:.4} c={:.4}  alpha={:.3} beta={:.3} gamma={:.3}",
        p.a, p.b, p.c, p.alpha, p.beta, p.gamma
    );
    println!("volume:      {:.4} Å³", lattice.volume());
    println!("space group: {} ({})", crystal.space_group(), crystal.space_group_number());

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for atom in crystal.structure().iter_atoms() {
        *counts.entry(atom.symbol()).or_default() += 1;
    }
    let composition: Vec<String> = counts.iter().map(|(s, n)| format!("{}{}", s, n)).collect();
    println!(
        "atoms:       {} ({})",
        crystal.structure().get_num_of_atoms(),
        composition.join(" ")
    );
    Ok(())
}

// End of File
