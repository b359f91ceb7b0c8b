//! ICC output profile registry.
//!
//! Profiles are read from the configured directory once per process and
//! shared read-only afterwards.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use cmyk_pdf::IccProfile;

use crate::models::DEFAULT_PROFILE_ID;

/// A profile the server knows how to load.
#[derive(Debug, Clone, Copy)]
pub struct ProfileDescriptor {
    pub id: &'static str,
    pub file_name: &'static str,
    pub name: &'static str,
    pub output_condition_identifier: &'static str,
    pub output_condition: &'static str,
}

pub const KNOWN_PROFILES: [ProfileDescriptor; 3] = [
    ProfileDescriptor {
        id: "coated_fogra39",
        file_name: "CoatedFOGRA39.icc",
        name: "Coated FOGRA39",
        output_condition_identifier: "Coated FOGRA39",
        output_condition: "Coated FOGRA39",
    },
    ProfileDescriptor {
        id: "iso_coated_v2",
        file_name: "ISOcoated_v2_eci.icc",
        name: "ISO Coated v2 (ECI)",
        output_condition_identifier: "ISOcoated_v2_eci",
        output_condition: "ISO Coated v2 (ECI)",
    },
    ProfileDescriptor {
        id: "us_web_coated_swop",
        file_name: "USWebCoatedSWOP.icc",
        name: "US Web Coated (SWOP) v2",
        output_condition_identifier: "USWebCoatedSWOP",
        output_condition: "U.S. Web Coated (SWOP) v2",
    },
];

/// A loaded profile together with the file it came from.
///
/// The path is handed to external tools that need the profile on disk.
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: IccProfile,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Color profile '{id}' is unavailable: {reason}")]
pub struct ProfileUnavailable {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<LoadedProfile>,
    /// Why the default profile could not be loaded, if it could not.
    default_error: Option<String>,
}

static SHARED: OnceLock<Arc<ProfileRegistry>> = OnceLock::new();

impl ProfileRegistry {
    /// Load every known profile found in `dir`.
    ///
    /// Missing optional profiles are skipped; a missing default profile is
    /// remembered and reported by [`get`](Self::get).
    pub fn load(dir: &Path) -> Self {
        let mut profiles = Vec::new();
        let mut default_error = None;

        for descriptor in &KNOWN_PROFILES {
            let path = dir.join(descriptor.file_name);
            match load_profile(descriptor, &path) {
                Ok(profile) => {
                    tracing::info!(
                        id = descriptor.id,
                        path = %path.display(),
                        bytes = profile.data().len(),
                        "Loaded ICC profile"
                    );
                    profiles.push(LoadedProfile { profile, path });
                }
                Err(reason) if descriptor.id == DEFAULT_PROFILE_ID => {
                    tracing::error!(
                        id = descriptor.id,
                        path = %path.display(),
                        error = %reason,
                        "Default ICC profile unavailable"
                    );
                    default_error = Some(reason);
                }
                Err(reason) => {
                    tracing::warn!(
                        id = descriptor.id,
                        path = %path.display(),
                        error = %reason,
                        "Skipping ICC profile"
                    );
                }
            }
        }

        Self {
            profiles,
            default_error,
        }
    }

    /// Build a registry from already-loaded profiles.
    pub fn from_profiles(profiles: Vec<LoadedProfile>) -> Self {
        let default_error = (!profiles
            .iter()
            .any(|p| p.profile.id() == DEFAULT_PROFILE_ID))
        .then(|| format!("profile '{DEFAULT_PROFILE_ID}' was not provided"));

        Self {
            profiles,
            default_error,
        }
    }

    /// The process-wide registry, loaded from `dir` on first use.
    ///
    /// Later calls return the same registry regardless of `dir`.
    pub fn shared(dir: &Path) -> Arc<Self> {
        SHARED
            .get_or_init(|| Arc::new(Self::load(dir)))
            .clone()
    }

    /// Look up a profile by id, case-insensitively.
    ///
    /// Unknown ids fall back to the default profile.
    pub fn get(&self, id: &str) -> Result<&LoadedProfile, ProfileUnavailable> {
        let wanted = id.trim();
        if let Some(found) = self
            .profiles
            .iter()
            .find(|p| p.profile.id().eq_ignore_ascii_case(wanted))
        {
            return Ok(found);
        }

        if !wanted.eq_ignore_ascii_case(DEFAULT_PROFILE_ID) {
            tracing::debug!(requested = wanted, "Unknown color profile, using default");
        }

        self.profiles
            .iter()
            .find(|p| p.profile.id() == DEFAULT_PROFILE_ID)
            .ok_or_else(|| ProfileUnavailable {
                id: wanted.to_string(),
                reason: self
                    .default_error
                    .clone()
                    .unwrap_or_else(|| "default profile not loaded".to_string()),
            })
    }

    pub fn profiles(&self) -> &[LoadedProfile] {
        &self.profiles
    }

    pub fn default_error(&self) -> Option<&str> {
        self.default_error.as_deref()
    }
}

fn load_profile(descriptor: &ProfileDescriptor, path: &Path) -> Result<IccProfile, String> {
    let data = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let profile = IccProfile::new(descriptor.id, descriptor.name, data)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(profile.with_output_condition(
        descriptor.output_condition_identifier,
        descriptor.output_condition,
    ))
}
