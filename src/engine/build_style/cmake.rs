use crate::engine::settings::{Arch, CompilerKind, Os, Settings};

pub const UNIX_MAKEFILES: &str = "Unix Makefiles";
const MINGW_MAKEFILES: &str = "MinGW Makefiles";

/// The CMake generator used for `settings`.
pub fn generator(settings: &Settings) -> String {
    match (settings.compiler.kind, settings.os) {
        (CompilerKind::VisualStudio, _) => {
            match settings.compiler.version.as_deref() {
                Some("14") => "Visual Studio 14 2015".to_string(),
                Some("15") => "Visual Studio 15 2017".to_string(),
                Some("16") => "Visual Studio 16 2019".to_string(),
                _ => "Visual Studio 17 2022".to_string(),
            }
        }
        (_, Os::Windows) => MINGW_MAKEFILES.to_string(),
        _ => UNIX_MAKEFILES.to_string(),
    }
}

pub fn is_multi_config(generator: &str) -> bool {
    generator.starts_with("Visual Studio")
}

pub fn is_makefiles(generator: &str) -> bool {
    generator.ends_with("Makefiles")
}

/// Generator and toolchain arguments for the configure step.
pub fn command_line(settings: &Settings) -> Vec<String> {
    let generator = generator(settings);
    let mut args = vec!["-G".to_string(), generator.clone()];

    if is_multi_config(&generator) {
        let platform = match settings.arch {
            Arch::X86 => "Win32",
            Arch::X86_64 => "x64",
            Arch::Armv7 => "ARM",
            Arch::Armv8 => "ARM64",
        };
        args.push("-A".to_string());
        args.push(platform.to_string());
    } else {
        args.push(format!("-DCMAKE_BUILD_TYPE={}", settings.build_type));
    }

    args.push(format!("-DCONAN_COMPILER={}", settings.compiler.kind));
    if let Some(version) = &settings.compiler.version {
        args.push(format!("-DCONAN_COMPILER_VERSION={}", version));
    }

    if matches!(
        settings.compiler.kind,
        CompilerKind::Gcc | CompilerKind::Clang | CompilerKind::AppleClang
    ) {
        let flag = match settings.arch {
            Arch::X86 => Some("-m32"),
            Arch::X86_64 => Some("-m64"),
            _ => None,
        };

        if let Some(flag) = flag {
            args.push(format!("-DCONAN_C_FLAGS={}", flag));
            args.push(format!("-DCONAN_CXX_FLAGS={}", flag));
            args.push(format!("-DCONAN_SHARED_LINKER_FLAGS={}", flag));
        }
    }

    args
}

/// `--config <type>` for multi-config generators, nothing otherwise.
pub fn build_config(settings: &Settings) -> Vec<String> {
    if is_multi_config(&generator(settings)) {
        vec!["--config".to_string(), settings.build_type.to_string()]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::settings::BuildType;

    #[test]
    fn makefiles_on_linux() {
        let mut settings = Settings::new(Os::Linux, CompilerKind::Gcc, BuildType::Debug, Arch::X86);
        settings.apply("compiler.version=9").unwrap();

        assert_eq!(
            command_line(&settings),
            vec![
                "-G",
                "Unix Makefiles",
                "-DCMAKE_BUILD_TYPE=Debug",
                "-DCONAN_COMPILER=gcc",
                "-DCONAN_COMPILER_VERSION=9",
                "-DCONAN_C_FLAGS=-m32",
                "-DCONAN_CXX_FLAGS=-m32",
                "-DCONAN_SHARED_LINKER_FLAGS=-m32",
            ]
        );
        assert!(build_config(&settings).is_empty());
    }

    #[test]
    fn visual_studio_is_multi_config() {
        let mut settings = Settings::new(
            Os::Windows,
            CompilerKind::VisualStudio,
            BuildType::Release,
            Arch::X86_64,
        );
        settings.apply("compiler.version=15").unwrap();

        assert_eq!(
            command_line(&settings),
            vec![
                "-G",
                "Visual Studio 15 2017",
                "-A",
                "x64",
                "-DCONAN_COMPILER=Visual Studio",
                "-DCONAN_COMPILER_VERSION=15",
            ]
        );
        assert_eq!(build_config(&settings), vec!["--config", "Release"]);
    }

    #[test]
    fn mingw_on_windows_with_gcc() {
        let settings = Settings::new(Os::Windows, CompilerKind::Gcc, BuildType::Release, Arch::Armv8);

        assert_eq!(generator(&settings), "MinGW Makefiles");
        assert!(is_makefiles(&generator(&settings)));
        assert!(!command_line(&settings).iter().any(|x| x.contains("-m64")));
    }
}
