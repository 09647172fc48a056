use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    #[error("setting `{0}` should look like key=value")]
    Malformed(String),

    #[error("unknown setting {0}")]
    Unknown(String),

    #[error("`{value}` is not a supported value for {key}")]
    Unsupported { key: &'static str, value: String },

    #[error("could not detect {0} of this host, pass it with -s")]
    Undetectable(&'static str),
}

macro_rules! setting_enum {
    ($name:ident, $key:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn parse(value: &str) -> Result<Self, SettingsError> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(SettingsError::Unsupported {
                        key: $key,
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

setting_enum!(Os, "os", {
    Linux => "Linux",
    Macos => "Macos",
    Windows => "Windows",
    FreeBsd => "FreeBSD",
});

setting_enum!(Arch, "arch", {
    X86 => "x86",
    X86_64 => "x86_64",
    Armv7 => "armv7",
    Armv8 => "armv8",
});

setting_enum!(BuildType, "build_type", {
    Debug => "Debug",
    Release => "Release",
    RelWithDebInfo => "RelWithDebInfo",
    MinSizeRel => "MinSizeRel",
});

setting_enum!(CompilerKind, "compiler", {
    Gcc => "gcc",
    Clang => "clang",
    AppleClang => "apple-clang",
    VisualStudio => "Visual Studio",
});

impl Os {
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::Macos),
            "windows" => Some(Os::Windows),
            "freebsd" => Some(Os::FreeBsd),
            _ => None,
        }
    }
}

impl Arch {
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86" => Some(Arch::X86),
            "x86_64" => Some(Arch::X86_64),
            "arm" => Some(Arch::Armv7),
            "aarch64" => Some(Arch::Armv8),
            _ => None,
        }
    }
}

impl CompilerKind {
    /// The toolchain a host of `os` is assumed to use when none is given.
    pub fn default_for(os: Os) -> Self {
        match os {
            Os::Windows => CompilerKind::VisualStudio,
            Os::Macos => CompilerKind::AppleClang,
            Os::FreeBsd => CompilerKind::Clang,
            Os::Linux => CompilerKind::Gcc,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Compiler {
    pub kind: CompilerKind,
    pub version: Option<String>,
}

/// Platform and toolchain the package is built for.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Settings {
    pub os: Os,
    pub compiler: Compiler,
    pub build_type: BuildType,
    pub arch: Arch,
}

impl Settings {
    pub fn new(os: Os, compiler: CompilerKind, build_type: BuildType, arch: Arch) -> Self {
        Settings {
            os,
            compiler: Compiler {
                kind: compiler,
                version: None,
            },
            build_type,
            arch,
        }
    }

    /// Settings of the running host, building in release mode, with
    /// `overrides` applied in order. `os` and `arch` overrides also stand in
    /// for a host that cannot be detected.
    pub fn resolve(overrides: &[String]) -> Result<Self, SettingsError> {
        Settings::resolve_on(Os::current(), Arch::current(), overrides)
    }

    fn resolve_on(
        mut os: Option<Os>,
        mut arch: Option<Arch>,
        overrides: &[String],
    ) -> Result<Self, SettingsError> {
        for assignment in overrides {
            match assignment.split_once('=') {
                Some(("os", value)) => os = Some(Os::parse(value)?),
                Some(("arch", value)) => arch = Some(Arch::parse(value)?),
                _ => {}
            }
        }

        let os = os.ok_or(SettingsError::Undetectable("os"))?;
        let arch = arch.ok_or(SettingsError::Undetectable("arch"))?;

        let mut settings = Settings::new(os, CompilerKind::default_for(os), BuildType::Release, arch);
        for assignment in overrides {
            settings.apply(assignment)?;
        }

        Ok(settings)
    }

    /// Applies a `key=value` override such as `os=Windows` or
    /// `compiler.version=11`.
    pub fn apply(&mut self, assignment: &str) -> Result<(), SettingsError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| SettingsError::Malformed(assignment.to_string()))?;

        match key {
            "os" => self.os = Os::parse(value)?,
            "arch" => self.arch = Arch::parse(value)?,
            "build_type" => self.build_type = BuildType::parse(value)?,
            "compiler" => {
                let kind = CompilerKind::parse(value)?;
                if kind != self.compiler.kind {
                    self.compiler = Compiler {
                        kind,
                        version: None,
                    };
                }
            }
            "compiler.version" => {
                if value.is_empty() {
                    return Err(SettingsError::Unsupported {
                        key: "compiler.version",
                        value: value.to_string(),
                    });
                }
                self.compiler.version = Some(value.to_string());
            }
            _ => return Err(SettingsError::Unknown(key.to_string())),
        }

        Ok(())
    }

    /// `(key, value)` pairs for the named top level settings; `compiler`
    /// carries its version along.
    pub fn values(&self, names: &[String]) -> Vec<(String, String)> {
        let mut values = vec![];

        for name in names {
            match name.as_str() {
                "os" => values.push((name.clone(), self.os.to_string())),
                "arch" => values.push((name.clone(), self.arch.to_string())),
                "build_type" => values.push((name.clone(), self.build_type.to_string())),
                "compiler" => {
                    values.push((name.clone(), self.compiler.kind.to_string()));
                    if let Some(version) = &self.compiler.version {
                        values.push(("compiler.version".to_string(), version.clone()));
                    }
                }
                _ => {}
            }
        }

        values.sort();
        values
    }
}
