//! Host environment probing and default event properties
//!
//! Every event carries the same block of device/app metadata. The values come
//! from a [`HostEnvironment`], which is queried once per tracker and never
//! re-read.
//!
//! ## Absent values
//!
//! Metadata the host cannot report (no bundle version, no display) is
//! omitted from the property mapping rather than emitted as null.

use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;
use crate::types::{Properties, PropertyValue};

/// Identifies this library in the `koala_lib` property
pub const KOALA_LIB: &str = "rust";

/// Value of the `client_type` property
pub const CLIENT_TYPE: &str = "native";

// ============================================
// Device idiom
// ============================================

/// Device class, used to derive `device_format` and `client_platform`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceIdiom {
    Phone,
    Tablet,
    Tv,
    #[default]
    Unspecified,
}

impl DeviceIdiom {
    /// Value of the `device_format` property
    pub fn device_format(&self) -> &'static str {
        match self {
            DeviceIdiom::Phone => "phone",
            DeviceIdiom::Tablet => "tablet",
            DeviceIdiom::Tv => "tv",
            DeviceIdiom::Unspecified => "unspecified",
        }
    }

    /// Value of the `client_platform` property
    pub fn client_platform(&self) -> &'static str {
        match self {
            DeviceIdiom::Phone | DeviceIdiom::Tablet => "ios",
            DeviceIdiom::Tv => "tvos",
            DeviceIdiom::Unspecified => "unspecified",
        }
    }
}

// ============================================
// Host environment
// ============================================

/// Source of device and application metadata.
pub trait HostEnvironment {
    /// Hardware vendor
    fn manufacturer(&self) -> String;

    /// Application build number
    fn app_version(&self) -> Option<String>;

    /// Application marketing version
    fn app_release(&self) -> Option<String>;

    /// Hardware machine identifier (e.g. `iPhone10,3`, `x86_64`)
    fn model(&self) -> Option<String>;

    /// Operating system name
    fn os_name(&self) -> Option<String>;

    /// Operating system version
    fn os_version(&self) -> Option<String>;

    /// Display size in points as (width, height)
    fn screen_size(&self) -> Option<(f64, f64)>;

    /// Device class
    fn idiom(&self) -> DeviceIdiom;
}

/// Reads the machine the process is running on.
///
/// Bundle versions, screen size and idiom are not discoverable from a plain
/// process, so they come from the `[device]` config section.
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    overrides: DeviceConfig,
}

impl SystemHost {
    pub fn new(overrides: DeviceConfig) -> Self {
        Self { overrides }
    }
}

impl HostEnvironment for SystemHost {
    fn manufacturer(&self) -> String {
        system_vendor().unwrap_or_else(|| "unknown".to_string())
    }

    fn app_version(&self) -> Option<String> {
        self.overrides.app_version.clone()
    }

    fn app_release(&self) -> Option<String> {
        self.overrides.app_release.clone()
    }

    fn model(&self) -> Option<String> {
        machine_identifier()
    }

    fn os_name(&self) -> Option<String> {
        use sysinfo::{System, SystemExt};
        System::new().name()
    }

    fn os_version(&self) -> Option<String> {
        use sysinfo::{System, SystemExt};
        System::new().os_version()
    }

    fn screen_size(&self) -> Option<(f64, f64)> {
        match (self.overrides.screen_width, self.overrides.screen_height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    fn idiom(&self) -> DeviceIdiom {
        self.overrides.idiom
    }
}

#[cfg(target_vendor = "apple")]
fn system_vendor() -> Option<String> {
    Some("Apple".to_string())
}

#[cfg(target_os = "linux")]
fn system_vendor() -> Option<String> {
    std::fs::read_to_string("/sys/class/dmi/id/sys_vendor")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(not(any(target_vendor = "apple", target_os = "linux")))]
fn system_vendor() -> Option<String> {
    None
}

/// Machine field of `uname(2)`; on Apple platforms this matches `hw.machine`.
#[cfg(unix)]
fn machine_identifier() -> Option<String> {
    // SAFETY: utsname is plain old data and uname only writes into it.
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    // SAFETY: uname NUL-terminates every field on success.
    let machine = unsafe { std::ffi::CStr::from_ptr(uts.machine.as_ptr()) };
    Some(machine.to_string_lossy().into_owned()).filter(|s| !s.is_empty())
}

#[cfg(not(unix))]
fn machine_identifier() -> Option<String> {
    Some(std::env::consts::ARCH.to_string())
}

/// Host with fixed values, for tests and embedders that already know them.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub manufacturer: String,
    pub app_version: Option<String>,
    pub app_release: Option<String>,
    pub model: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub screen_size: Option<(f64, f64)>,
    pub idiom: DeviceIdiom,
}

impl HostEnvironment for StaticHost {
    fn manufacturer(&self) -> String {
        self.manufacturer.clone()
    }

    fn app_version(&self) -> Option<String> {
        self.app_version.clone()
    }

    fn app_release(&self) -> Option<String> {
        self.app_release.clone()
    }

    fn model(&self) -> Option<String> {
        self.model.clone()
    }

    fn os_name(&self) -> Option<String> {
        self.os_name.clone()
    }

    fn os_version(&self) -> Option<String> {
        self.os_version.clone()
    }

    fn screen_size(&self) -> Option<(f64, f64)> {
        self.screen_size
    }

    fn idiom(&self) -> DeviceIdiom {
        self.idiom
    }
}

// ============================================
// Default properties
// ============================================

/// Metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultProperties {
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    pub koala_lib: &'static str,
    pub client_type: &'static str,
    pub device_format: &'static str,
    pub client_platform: &'static str,
}

impl DefaultProperties {
    /// Query the host once and capture every default property
    pub fn collect(host: &dyn HostEnvironment) -> Self {
        let idiom = host.idiom();
        let (screen_width, screen_height) = match host.screen_size() {
            Some((w, h)) => (Some(truncate_points(w)), Some(truncate_points(h))),
            None => (None, None),
        };

        let props = Self {
            manufacturer: host.manufacturer(),
            app_version: host.app_version(),
            app_release: host.app_release(),
            model: host.model(),
            os: host.os_name(),
            os_version: host.os_version(),
            screen_width,
            screen_height,
            koala_lib: KOALA_LIB,
            client_type: CLIENT_TYPE,
            device_format: idiom.device_format(),
            client_platform: idiom.client_platform(),
        };

        tracing::debug!(
            manufacturer = %props.manufacturer,
            model = ?props.model,
            os = ?props.os,
            device_format = props.device_format,
            "Collected default properties"
        );

        props
    }

    /// Render as a property mapping, omitting absent values
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();

        props.insert("manufacturer".into(), self.manufacturer.as_str().into());
        insert_opt(&mut props, "app_version", &self.app_version);
        insert_opt(&mut props, "app_release", &self.app_release);
        insert_opt(&mut props, "model", &self.model);
        insert_opt(&mut props, "os", &self.os);
        insert_opt(&mut props, "os_version", &self.os_version);
        if let Some(w) = self.screen_width {
            props.insert("screen_width".into(), w.into());
        }
        if let Some(h) = self.screen_height {
            props.insert("screen_height".into(), h.into());
        }
        props.insert("koala_lib".into(), self.koala_lib.into());
        props.insert("client_type".into(), self.client_type.into());
        props.insert("device_format".into(), self.device_format.into());
        props.insert("client_platform".into(), self.client_platform.into());

        props
    }
}

fn insert_opt(props: &mut Properties, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), PropertyValue::String(v.clone()));
    }
}

/// Truncate a point measurement to an unsigned integer (negative/NaN -> 0)
fn truncate_points(value: f64) -> u32 {
    value as u32
}
