use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
}

pub fn build_info() -> BuildInfo {
    let build_profile = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_profile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_serializes() {
        let json = serde_json::to_value(build_info()).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["build_profile"].is_string());
    }
}
