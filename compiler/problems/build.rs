use std::{
    env,
    error::Error,
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
    process,
};

/// One row of `problem-codes.csv`.
struct ProblemDef {
    /// Stable code that appears in diagnostics (for example `S0202`).
    code: String,
    /// Variant name of the generated enumeration.
    name: String,
    /// Base message. Diagnostics append their own context to it.
    message: String,
}

fn read_definitions() -> Result<Vec<ProblemDef>, Box<dyn Error>> {
    let mut src_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    src_path.push("resources");
    src_path.push("problem-codes.csv");

    let src = fs::read_to_string(&src_path)
        .map_err(|e| format!("Unable to read {}: {}", src_path.display(), e))?;

    let mut defs = vec![];
    let mut rdr = csv::Reader::from_reader(src.as_bytes());
    for result in rdr.records() {
        let record = result?;
        let column = |index: usize| {
            record
                .get(index)
                .map(|value| value.trim().to_string())
                .ok_or_else(|| format!("Record {:?} is not valid at column {}", record, index))
        };
        defs.push(ProblemDef {
            code: column(0)?,
            name: column(1)?,
            message: column(2)?,
        });
    }
    Ok(defs)
}

fn write_problems(defs: &[ProblemDef], out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]")?;
    writeln!(out, "pub enum Problem {{")?;
    for def in defs {
        writeln!(out, "    {},", def.name)?;
    }
    writeln!(out, "}}\n")?;

    writeln!(out, "impl Problem {{")?;

    writeln!(out, "    /// Returns the code for the particular problem as a string.")?;
    writeln!(out, "    pub fn code(&self) -> &'static str {{")?;
    writeln!(out, "        match self {{")?;
    for def in defs {
        writeln!(out, "            Problem::{} => \"{}\",", def.name, def.code)?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Returns the message for the particular problem as a string.")?;
    writeln!(out, "    /// The message is constant and does not depend on the particular instance of the problem.")?;
    writeln!(out, "    pub fn message(&self) -> &'static str {{")?;
    writeln!(out, "        match self {{")?;
    for def in defs {
        writeln!(out, "            Problem::{} => {:?},", def.name, def.message)?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Returns every problem in catalog order.")?;
    writeln!(out, "    pub fn all() -> &'static [Problem] {{")?;
    writeln!(out, "        &[")?;
    for def in defs {
        writeln!(out, "            Problem::{},", def.name)?;
    }
    writeln!(out, "        ]")?;
    writeln!(out, "    }}")?;

    writeln!(out, "}}")?;
    Ok(())
}

fn create_problems() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=resources/problem-codes.csv");

    let defs = read_definitions()?;

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::create_dir_all(&out_dir)
        .map_err(|e| format!("Unable to create directory {}: {}", out_dir.display(), e))?;

    let out_path = out_dir.join("problems.rs");
    let file =
        File::create(&out_path).map_err(|e| format!("Unable to create 'problems.rs': {}", e))?;
    let mut out = BufWriter::new(file);
    write_problems(&defs, &mut out)?;
    out.flush()?;

    Ok(())
}

fn main() {
    if let Err(err) = create_problems() {
        println!("problem generating problems.rs: {}", err);
        process::exit(1);
    }
}
