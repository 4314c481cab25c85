// build.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // A `lang_*` feature wins over ARCHITECT_LANG, which wins over English.
    let mut feature_langs: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(|lang| lang.to_lowercase())
        })
        .collect();
    feature_langs.sort();

    let lang = match feature_langs.first() {
        Some(first) => {
            if feature_langs.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    feature_langs, first
                );
            }
            first.clone()
        }
        None => env::var("ARCHITECT_LANG").unwrap_or_else(|_| "en".to_string()),
    };

    println!("cargo:rustc-env=ARCHITECT_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=ARCHITECT_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // English is always loaded so a partial translation never leaves a key undefined.
    let fallback = fs::read_to_string("locales/en.toml")
        .expect("Failed to read fallback language file: locales/en.toml");
    let mut messages: HashMap<String, String> =
        toml::from_str(&fallback).expect("Failed to parse locales/en.toml");

    if lang != "en" {
        let path = format!("locales/{}.toml", lang);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let overrides: HashMap<String, String> = toml::from_str(&content)
                    .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path, e));
                messages.extend(overrides);
            }
            Err(_) => println!(
                "cargo:warning=Language file '{}' not found. Falling back to 'en'.",
                path
            ),
        }
    }

    // Sorted output keeps the generated file stable between builds.
    let mut keys: Vec<&String> = messages.keys().collect();
    keys.sort();

    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for key in keys {
        let value = messages[key].replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, value));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), code)
        .expect("Failed to write translations.rs");
}
