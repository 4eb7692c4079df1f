use serde::Deserialize;
use std::{collections::BTreeMap, env, fs, path::PathBuf};

/// Layout of `flags.json`: a `default` table plus optional per-architecture overrides.
#[derive(Debug, Deserialize)]
struct FlagFile {
    default: BTreeMap<String, String>,
    #[serde(flatten)]
    arch: BTreeMap<String, BTreeMap<String, String>>,
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();
    let flags_str =
        fs::read_to_string(PathBuf::from(manifest_dir.clone()).join("../../flags.json")).unwrap();
    let file: FlagFile = serde_json::from_str(&flags_str).unwrap();
    let mut flags = file.default;
    if let Some(overrides) = file.arch.get(target_arch.as_str()) {
        flags.extend(overrides.clone());
    }
    make_flags(&flags);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../flags.json");
}

fn make_flags(flagmap: &BTreeMap<String, String>) {
    let mut s = String::new();
    for (key, value) in flagmap {
        let value: usize = value
            .trim()
            .replace("_", "")
            .parse()
            .unwrap_or_else(|err| panic!("Flag {} is not a number: {:?}", key, err));
        s += format!("/// `{}` from flags.json\n", key).as_str();
        s += format!("pub const {}: usize = {};\n", key, value).as_str();
    }
    let out_dir = env::var("OUT_DIR").unwrap();
    let path = PathBuf::from(out_dir).join("build_flags.rs");
    fs::write(path, s).unwrap();
}
