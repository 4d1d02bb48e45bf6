use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::model::{Assignment, LinearExpr, LinearModel};

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

fn format_expr(expr: &LinearExpr) -> String {
    let mut out = String::new();
    for (k, (var, c)) in expr.terms().enumerate() {
        let sign = if c < 0 { "-" } else { "+" };
        if k == 0 {
            if c < 0 {
                out.push_str("- ");
            }
        } else {
            out.push_str(&format!(" {sign} "));
        }
        match c.abs() {
            1 => out.push_str(&var.to_string()),
            a => out.push_str(&format!("{a} {var}")),
        }
    }
    if out.is_empty() {
        // the LP grammar wants at least one term on the left
        out.push_str("0 m_0");
    }
    out
}

/// Write `model` in CPLEX LP format.
///
/// Every variable is preceded by a comment line naming its triple, so the
/// file can be read back by a person as well as a solver.
pub fn write_lp<W: Write>(out: &mut W, model: &LinearModel) -> io::Result<()> {
    writeln!(out, "\\ Problem name: {}", model.name)?;
    for (k, triple) in model.variables().iter().enumerate() {
        writeln!(out, "\\ m_{k} = {triple}")?;
    }

    writeln!(out, "Minimize")?;
    if model.num_variables() > 0 {
        writeln!(out, " obj: 0 m_0")?;
    } else {
        writeln!(out, " obj:")?;
    }

    writeln!(out, "Subject To")?;
    let mut seen = std::collections::HashMap::new();
    for c in model.constraints() {
        let k = seen.entry(c.family).or_insert(0usize);
        writeln!(out, " {}_{}: {} {} {}", c.family, k, format_expr(&c.expr), c.sense.symbol(), c.rhs)?;
        *k += 1;
    }

    writeln!(out, "Binary")?;
    for k in 0..model.num_variables() {
        writeln!(out, " m_{k}")?;
    }
    writeln!(out, "End")?;
    Ok(())
}

/// Write the model as an LP file.
/// If `path` ends with `.gz`, the output is gzip-compressed.
/// `-` (stdout) is rejected.
pub fn write_lp_model<P: AsRef<Path>>(path: P, model: &LinearModel) -> io::Result<()> {
    let p = path.as_ref();
    if p.as_os_str() == "-" {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "writing to stdout is not supported by write_lp_model",
        ));
    }

    let mut out: Box<dyn Write> = if is_gz(p) {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };

    write_lp(&mut out, model)?;
    out.flush()?;
    log::info!("wrote {} variables to {}", model.num_variables(), p.display());
    Ok(())
}

/// Parse a solver solution listing `name value` per line.
///
/// Blank lines and lines starting with `#` are skipped. A listing without a
/// single assignment is how solvers report infeasibility and yields `None`.
pub fn parse_solution<R: BufRead>(reader: R, model: &LinearModel) -> Result<Option<Assignment>> {
    let mut values = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::Parse(format!("line {}: expected `name value`, got `{line}`", lineno + 1)));
        };
        let value: f64 = value
            .parse()
            .map_err(|_| Error::Parse(format!("line {}: `{value}` is not a number", lineno + 1)))?;
        values.push((name.to_string(), value));
    }

    if values.is_empty() {
        return Ok(None);
    }
    model
        .assignment_from_values(values.iter().map(|(name, value)| (name.as_str(), *value)))
        .map(Some)
}

/// Read a solution file, transparently decompressing `.gz`.
pub fn read_solution<P: AsRef<Path>>(path: P, model: &LinearModel) -> Result<Option<Assignment>> {
    let p = path.as_ref();
    let file = File::open(p)?;
    let input: Box<dyn Read> = if is_gz(p) { Box::new(GzDecoder::new(file)) } else { Box::new(file) };
    parse_solution(BufReader::new(input), model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Triple;
    use crate::model::{Sense, VarId};
    use crate::tree::Tree;

    fn small_model() -> LinearModel {
        let mut model = LinearModel::new("phylogenetictrees");
        let leaf = |k| Triple(Tree::Leaf(k), Tree::Leaf(k), Tree::Leaf(k));
        let a = model.add_variable(leaf(1));
        let b = model.add_variable(leaf(2));
        model.add_constraint("pick", LinearExpr::new().plus(a, 1).plus(b, 1), Sense::Equal, 1);
        model.add_constraint("order", LinearExpr::new().plus(a, -1).plus(b, 2), Sense::GreaterEq, -1);
        model.add_constraint("pick", LinearExpr::new().plus(b, -1), Sense::LessEq, 0);
        model
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tree-semilattice-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_lp_layout() {
        let mut buf = Vec::new();
        write_lp(&mut buf, &small_model()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let expected = "\
\\ Problem name: phylogenetictrees
\\ m_0 = (1, 1, 1)
\\ m_1 = (2, 2, 2)
Minimize
 obj: 0 m_0
Subject To
 pick_0: m_0 + m_1 = 1
 order_0: - m_0 + 2 m_1 >= -1
 pick_1: - m_1 <= 0
Binary
 m_0
 m_1
End
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(format_expr(&LinearExpr::new()), "0 m_0");
        assert_eq!(format_expr(&LinearExpr::new().plus(VarId(3), -2)), "- 2 m_3");
    }

    #[test]
    fn test_stdout_rejected() {
        let err = write_lp_model("-", &small_model()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_solution() {
        let model = small_model();
        let text = "# Objective value = 0\nm_0 1\n\nm_1 -0\n";
        let assignment = parse_solution(text.as_bytes(), &model).unwrap();
        assert_eq!(assignment, Some(Assignment(vec![true, false])));

        assert_eq!(parse_solution("# infeasible\n".as_bytes(), &model).unwrap(), None);
        assert!(matches!(parse_solution("m_0\n".as_bytes(), &model), Err(Error::Parse(_))));
        assert!(matches!(parse_solution("m_0 yes\n".as_bytes(), &model), Err(Error::Parse(_))));
        assert!(matches!(parse_solution("m_9 1\n".as_bytes(), &model), Err(Error::UnknownVariable(_))));
    }

    #[test]
    fn test_gzip_files() {
        let model = small_model();
        let lp = temp_path("model.lp.gz");
        write_lp_model(&lp, &model).unwrap();
        let mut text = String::new();
        GzDecoder::new(File::open(&lp).unwrap()).read_to_string(&mut text).unwrap();
        assert!(text.starts_with("\\ Problem name: phylogenetictrees\n"));
        assert!(text.ends_with("End\n"));
        std::fs::remove_file(&lp).unwrap();

        let sol = temp_path("model.sol.gz");
        let mut enc = GzEncoder::new(File::create(&sol).unwrap(), Compression::default());
        enc.write_all(b"m_1 1\n").unwrap();
        enc.finish().unwrap();
        assert_eq!(read_solution(&sol, &model).unwrap(), Some(Assignment(vec![false, true])));
        std::fs::remove_file(&sol).unwrap();
    }

    #[test]
    fn test_missing_solution_file() {
        let err = read_solution(temp_path("does-not-exist.sol"), &small_model()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
