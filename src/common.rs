use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_string_to_file(filename: impl AsRef<Path>, content: &str) -> std::io::Result<()> {
    let path = filename.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("menuseed.yaml");

        write_string_to_file(&path, "backend: {}\n").expect("write");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "backend: {}\n"
        );
    }
}
