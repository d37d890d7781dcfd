use std::env;
use std::fs;
use std::path::Path;

// Claves que `config.rs` lee con option_env!
const KNOWN_KEYS: &[&str] = &[
    "FLEET_API_BASE_URL",
    "FLEET_LOGIN_PAGE",
    "FLEET_DASHBOARD_PAGE",
    "FLEET_PAGE_SIZE",
    "FLEET_SEARCH_DEBOUNCE_MS",
    "FLEET_STATUS_AUTO_CLOSE_MS",
    "FLEET_LOGOUT_NOTICE_MS",
    "FLEET_LOGOUT_REDIRECT_MS",
    "FLEET_DEFAULT_MODULE",
    "FLEET_CURRENCY",
    "FLEET_ENVIRONMENT",
    "FLEET_ENABLE_LOGGING",
];

fn main() {
    let env_file = Path::new(".env");

    if env_file.exists() {
        println!("cargo:rerun-if-changed=.env");

        if let Ok(contents) = fs::read_to_string(env_file) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                // KEY=VALUE
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"');

                    if !KNOWN_KEYS.contains(&key) {
                        println!("cargo:warning=Clave desconocida en .env ignorada: {}", key);
                        continue;
                    }

                    // La variable del entorno real tiene prioridad
                    if env::var(key).is_err() {
                        println!("cargo:rustc-env={}={}", key, value);
                    }
                }
            }
        }
    } else {
        println!("cargo:warning=No .env file found. Using default values. Copy .env.example to .env to point the dashboard at your API.");
    }

    for key in KNOWN_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env.example");
}
