//! Built-in manifest and build plan.

use crate::enums::RunKind;
use crate::stage::{Stage, StagePlan};

/// Paths expected in a well-formed Android project layout.
pub const DEFAULT_REQUIRED_FILES: &[&str] = &[
    "build.gradle",
    "settings.gradle",
    "app/build.gradle",
    "gradlew",
    "gradlew.bat",
    "gradle/wrapper/gradle-wrapper.properties",
    "src/main/AndroidManifest.xml",
];

/// `(label, offset_ms, message)` for the simulated standalone build.
pub const DEFAULT_BUILD_STAGES: &[(&str, u64, &str)] = &[
    ("start", 0, "Starting standalone build process..."),
    ("deps", 500, "Step 1/4: Installing frontend dependencies..."),
    ("deps-done", 2000, " > npm install complete."),
    ("wrapper", 2500, "Step 2/4: Setting Gradle Wrapper permissions..."),
    ("wrapper-done", 3000, " > chmod +x ./gradlew complete."),
    (
        "assemble",
        3500,
        "Step 3/4: Building the Android application with Gradle...",
    ),
    ("assemble-done", 6000, " > :app:assembleDebug SUCCESSFUL."),
    ("organize", 6500, "Step 4/4: Organizing output..."),
    ("done", 7000, "\nSuccess! Simulated APK is ready."),
];

#[must_use]
pub fn default_required_files() -> Vec<String> {
    DEFAULT_REQUIRED_FILES
        .iter()
        .map(|path| (*path).to_string())
        .collect()
}

#[must_use]
pub fn default_build_stages() -> Vec<Stage> {
    DEFAULT_BUILD_STAGES
        .iter()
        .map(|(label, offset_ms, message)| Stage::new(*label, *offset_ms, *message))
        .collect()
}

#[must_use]
pub fn default_build_plan() -> StagePlan {
    StagePlan {
        kind: RunKind::Build,
        stages: default_build_stages(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_plan_is_declared_in_delivery_order() {
        let plan = default_build_plan();
        assert_eq!(plan.ordered(), plan.stages);
        assert_eq!(plan.len(), 9);
        assert_eq!(plan.span().as_millis(), 7000);
    }

    #[test]
    fn manifest_has_nested_entries() {
        let files = default_required_files();
        assert!(files.iter().any(|f| f.contains('/')));
        assert_eq!(files.len(), DEFAULT_REQUIRED_FILES.len());
    }
}
