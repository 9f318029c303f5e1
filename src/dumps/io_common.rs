use std::path::{Path, PathBuf};

/// The name of the input file, without directory or extension.
pub fn simplify_file_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string())
}

/// Where the report of `input` is written: `<out_dir>/<name>_report.<extension>`.
pub fn output_path(out_dir: &Path, input: &Path, extension: &str) -> PathBuf {
    out_dir.join(format!(
        "{}_report.{}",
        simplify_file_name(input),
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(simplify_file_name(Path::new("data/2020/georgia.json")), "georgia");
        assert_eq!(simplify_file_name(Path::new("pa")), "pa");
        assert_eq!(
            output_path(Path::new("out"), Path::new("data/georgia.json"), "csv"),
            PathBuf::from("out/georgia_report.csv")
        );
    }
}
