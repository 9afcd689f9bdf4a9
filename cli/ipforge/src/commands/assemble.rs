//! `ipforge assemble`: assemble descriptors and emit the peripheral documents.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use ipforge_assemble::output::{format_text, peripheral_json};
use ipforge_assemble::{assemble_all, Peripheral};

use super::{load_descriptor, Session};
use crate::config::OutputFormat;

/// Run `ipforge assemble <files..> [--format] [--output]`.
///
/// Flags override the `[output]` section of `ipforge.toml`. Without an output
/// directory the documents go to stdout.
pub fn run(session: &Session, files: &[PathBuf], format: Option<OutputFormat>, output: Option<&Path>) -> Result<()> {
    let format = format.unwrap_or(session.config.output.format);
    let out_dir = output
        .map(Path::to_path_buf)
        .or_else(|| session.config.output.dir.as_ref().map(|d| session.project_dir.join(d)));

    let decls = files.iter().map(|f| load_descriptor(f)).collect::<Result<Vec<_>>>()?;
    let results = assemble_all(&session.assembler(), &decls);

    let mut failed = 0;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(peripheral) => {
                let document = render(&peripheral, format)?;
                match &out_dir {
                    Some(dir) => {
                        let path = write_document(dir, &peripheral, format, &document)?;
                        println!("{} -> {}", file.display(), path.display());
                    }
                    None => print!("{document}"),
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("{}: {e}", file.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} descriptors failed to assemble", files.len());
    }
    Ok(())
}

fn render(peripheral: &Peripheral, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => {
            let mut json = peripheral_json(peripheral).context("serializing peripheral")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format_text(peripheral),
    })
}

fn write_document(dir: &Path, peripheral: &Peripheral, format: OutputFormat, document: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.{}", peripheral.name(), format.extension()));
    std::fs::write(&path, document).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_iob_dma;
    use crate::config::IpforgeConfig;

    fn session(dir: &Path) -> Session {
        Session::with_config(IpforgeConfig::default(), dir.to_path_buf()).unwrap()
    }

    #[test]
    fn writes_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_iob_dma(dir.path());
        let out = dir.path().join("out");

        run(&session(dir.path()), &[file], Some(OutputFormat::Json), Some(&out)).unwrap();

        let text = std::fs::read_to_string(out.join("iob_dma.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["identity"]["name"], "iob_dma");
        // The CLI default appends the version register.
        assert_eq!(doc["registers"]["total_words"], 7);
    }

    #[test]
    fn writes_text_report_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_iob_dma(dir.path());
        let mut config = IpforgeConfig::default();
        config.output.dir = Some(PathBuf::from("reports"));
        config.output.format = OutputFormat::Text;
        let session = Session::with_config(config, dir.path().to_path_buf()).unwrap();

        run(&session, &[file], None, None).unwrap();

        let text = std::fs::read_to_string(dir.path().join("reports").join("iob_dma.txt")).unwrap();
        assert!(text.starts_with("iob_dma V0.10 [sim emb]"));
        assert!(text.contains("=== Register Map ==="));
    }

    #[test]
    fn failure_is_reported_after_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_iob_dma(dir.path());
        let bad = dir.path().join("bad.toml");
        std::fs::write(
            &bad,
            "[peripheral]\nname = \"bad\"\nversion = \"V0.1\"\n\n[[parameters]]\nname = \"DATA_W\"\ndefault = \"MISSING\"\n",
        )
        .unwrap();
        let out = dir.path().join("out");

        let err = run(&session(dir.path()), &[good, bad], None, Some(&out)).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(out.join("iob_dma.json").is_file());
        assert!(!out.join("bad.json").exists());
    }

    #[test]
    fn unreadable_descriptor_aborts_before_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = run(&session(dir.path()), &[missing], None, None).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
