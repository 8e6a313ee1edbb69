use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=../templates/");

    let mut templates = Vec::new();
    for entry in fs::read_dir("../templates")? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "bwt") {
            continue;
        }

        let name = entry
            .file_name()
            .into_string()
            .map_err(|name| format!("built in template with non utf8 name: {name:?}"))?;
        let content = fs::read_to_string(&path)?;

        templates.push((name, content));
    }
    templates.sort();

    let mut out = String::new();

    out.push_str(
        "const BUILT_IN_TEMPLATES_RAW: [(&str, &str); NUM_BUILT_IN_TEMPLATES] = [\n",
    );
    for (name, content) in &templates {
        out.push_str(&format!("    ({name:?}, {content:?}),\n"));
    }
    out.push_str("];\n");
    out.push('\n');
    out.push_str(&format!(
        "const NUM_BUILT_IN_TEMPLATES: usize = {};\n",
        templates.len()
    ));

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or("`OUT_DIR` is not set")?);
    fs::write(out_dir.join("built_in.gen.rs"), out)?;

    Ok(())
}
