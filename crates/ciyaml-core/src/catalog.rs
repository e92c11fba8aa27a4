//! Fixed vocabularies of the pipeline format.
//!
//! Built-in step names, legal job types, and the resource-class and image
//! whitelists each executor family is checked against.

/// Step keys handled by the platform itself rather than by a command.
pub const BUILT_IN_STEPS: &[&str] = &[
    "run",
    "checkout",
    "setup_remote_docker",
    "save_cache",
    "restore_cache",
    "store_artifacts",
    "store_test_results",
    "persist_to_workspace",
    "attach_workspace",
    "add_ssh_keys",
    "steps",
    "when",
    "unless",
];

/// Returns `true` if `name` is a built-in step.
pub fn is_built_in_step(name: &str) -> bool {
    BUILT_IN_STEPS.contains(&name)
}

/// Legal values of a job's `type` key.
pub const JOB_TYPES: &[&str] = &["build", "approval", "no-op", "release", "lock", "unlock"];

/// Job types whose `steps` are never executed.
pub const STEPLESS_JOB_TYPES: &[&str] = &["approval", "no-op", "release"];

/// Statuses a `requires` entry may wait for.
pub const REQUIRE_STATUSES: &[&str] = &["success", "failed", "canceled", "not_run"];

/// Keywords accepted by a `run` step's `when` key.
pub const RUN_WHEN_KEYWORDS: &[&str] = &["on_success", "always", "on_fail"];

/// The image `machine: true` resolves to.
pub const CURRENT_LINUX_IMAGE: &str = "ubuntu-2404:current";

pub const LINUX_IMAGES: &[&str] = &[
    // Ubuntu 20.04
    "ubuntu-2004:2024.11.1",
    "ubuntu-2004:2024.08.1",
    "ubuntu-2004:2024.05.1",
    "ubuntu-2004:2024.04.4",
    "ubuntu-2004:2024.01.2",
    "ubuntu-2004:2024.01.1",
    "ubuntu-2004:2023.10.1",
    "ubuntu-2004:2023.07.1",
    "ubuntu-2004:2023.04.2",
    "ubuntu-2004:2023.04.1",
    "ubuntu-2004:2023.02.1",
    "ubuntu-2004:2022.10.1",
    "ubuntu-2004:2022.07.1",
    "ubuntu-2004:2022.04.2",
    "ubuntu-2004:2022.04.1",
    "ubuntu-2004:202201-02",
    "ubuntu-2004:202201-01",
    "ubuntu-2004:202111-02",
    "ubuntu-2004:202111-01",
    "ubuntu-2004:202107-02",
    "ubuntu-2004:202104-01",
    "ubuntu-2004:202101-01",
    "ubuntu-2004:202010-01",
    "ubuntu-2004:current",
    "ubuntu-2004:edge",
    // Ubuntu 22.04
    "ubuntu-2204:2024.11.1",
    "ubuntu-2204:2024.08.1",
    "ubuntu-2204:2024.05.1",
    "ubuntu-2204:2024.04.4",
    "ubuntu-2204:2024.01.2",
    "ubuntu-2204:2024.01.1",
    "ubuntu-2204:2023.10.1",
    "ubuntu-2204:2023.07.2",
    "ubuntu-2204:2023.04.2",
    "ubuntu-2204:2023.04.1",
    "ubuntu-2204:2023.02.1",
    "ubuntu-2204:2022.10.2",
    "ubuntu-2204:2022.10.1",
    "ubuntu-2204:2022.07.2",
    "ubuntu-2204:2022.07.1",
    "ubuntu-2204:2022.04.2",
    "ubuntu-2204:2022.04.1",
    "ubuntu-2204:current",
    "ubuntu-2204:edge",
    // Ubuntu 24.04
    "ubuntu-2404:2024.11.1",
    "ubuntu-2404:2024.08.1",
    "ubuntu-2404:2024.05.1",
    "ubuntu-2404:current",
    "ubuntu-2404:edge",
    // Android
    "android:2024.11.1",
    "android:2024.04.1",
    "android:2024.01.1",
    "android:2023.11.1",
    "android:2023.10.1",
    "android:2023.09.1",
    "android:2023.08.1",
    "android:2023.07.1",
    "android:2023.06.1",
    "android:2023.05.1",
    "android:2023.04.1",
    "android:2023.03.1",
    "android:2023.02.1",
    "android:2022.12.1",
    "android:2022.09.1",
    "android:2022.08.1",
    "android:2022.07.1",
    "android:2022.06.2",
    "android:2022.06.1",
    "android:2022.04.1",
    "android:2022.03.1",
    "android:2022.01.1",
    "android:2021.12.1",
    "android:2021.10.1",
    "android:202102-01",
];

/// Linux resource classes, shared by Docker, Linux machine and Windows
/// executors. The empty string stands for "not specified".
pub const LINUX_RESOURCE_CLASSES: &[&str] = &[
    "small",
    "medium",
    "medium+",
    "large",
    "xlarge",
    "2xlarge",
    "2xlarge+",
    "arm.medium",
    "arm.large",
    "arm.xlarge",
    "arm.2xlarge",
    "",
];

pub const WINDOWS_IMAGES: &[&str] = &[
    // Windows Server 2019
    "windows-server-2019-vs2019:2024.12.1",
    "windows-server-2019-vs2019:2024.05.1",
    "windows-server-2019-vs2019:2024.01.1",
    "windows-server-2019-vs2019:2023.10.1",
    "windows-server-2019-vs2019:2023.08.1",
    "windows-server-2019-vs2019:2023.04.1",
    "windows-server-2019-vs2019:2022.08.1",
    "windows-server-2019-vs2019:current",
    "windows-server-2019-vs2019:edge",
    // Windows Server 2022
    "windows-server-2022-gui:2024.04.1",
    "windows-server-2022-gui:2024.01.1",
    "windows-server-2022-gui:2023.11.1",
    "windows-server-2022-gui:2023.10.1",
    "windows-server-2022-gui:2023.09.1",
    "windows-server-2022-gui:2023.08.1",
    "windows-server-2022-gui:2023.07.1",
    "windows-server-2022-gui:2023.06.1",
    "windows-server-2022-gui:2023.05.1",
    "windows-server-2022-gui:2023.04.1",
    "windows-server-2022-gui:2023.03.1",
    "windows-server-2022-gui:2022.08.1",
    "windows-server-2022-gui:2022.07.1",
    "windows-server-2022-gui:2022.06.1",
    "windows-server-2022-gui:2022.04.1",
    "windows-server-2022-gui:current",
    "windows-server-2022-gui:edge",
];

pub const WINDOWS_RESOURCE_CLASSES: &[&str] = &[
    "windows.medium",
    "windows.large",
    "windows.xlarge",
    "windows.2xlarge",
];

pub const LINUX_GPU_IMAGES: &[&str] = &[
    "linux-cuda-11:default",
    "linux-cuda-11:edge",
    "linux-cuda-12:default",
    "linux-cuda-12:edge",
];

pub const LINUX_GPU_RESOURCE_CLASSES: &[&str] = &[
    "gpu.nvidia.small.gen2",
    "gpu.nvidia.small.multi",
    "gpu.nvidia.medium.multi",
    "gpu.nvidia.medium",
    "gpu.nvidia.large",
];

pub const WINDOWS_GPU_IMAGES: &[&str] = &[
    "windows-server-2019-cuda:current",
    "windows-server-2019-cuda:edge",
];

pub const WINDOWS_GPU_RESOURCE_CLASSES: &[&str] = &["windows.gpu.nvidia.medium"];

/// A family of machine images and the resource classes they can run on.
#[derive(Debug, Clone, Copy)]
pub struct MachineFamily {
    pub name: &'static str,
    pub images: &'static [&'static str],
    pub resource_classes: &'static [&'static str],
}

/// Every machine family, in lookup order.
pub const MACHINE_FAMILIES: &[MachineFamily] = &[
    MachineFamily {
        name: "linux",
        images: LINUX_IMAGES,
        resource_classes: LINUX_RESOURCE_CLASSES,
    },
    MachineFamily {
        name: "windows",
        images: WINDOWS_IMAGES,
        resource_classes: WINDOWS_RESOURCE_CLASSES,
    },
    MachineFamily {
        name: "linux-gpu",
        images: LINUX_GPU_IMAGES,
        resource_classes: LINUX_GPU_RESOURCE_CLASSES,
    },
    MachineFamily {
        name: "windows-gpu",
        images: WINDOWS_GPU_IMAGES,
        resource_classes: WINDOWS_GPU_RESOURCE_CLASSES,
    },
];

/// Returns `true` if `resource_class` is valid for any machine family.
pub fn is_machine_resource_class(resource_class: &str) -> bool {
    MACHINE_FAMILIES
        .iter()
        .any(|family| family.resource_classes.contains(&resource_class))
}

/// Returns `true` if `image` is valid for any machine family.
pub fn is_machine_image(image: &str) -> bool {
    MACHINE_FAMILIES
        .iter()
        .any(|family| family.images.contains(&image))
}

/// Find the machine family a resource class belongs to.
///
/// The family is picked from the resource-class prefix: `arm.` classes are
/// Linux ARM, `gpu.nvidia.` classes are Linux GPU, `windows.gpu.` classes are
/// Windows GPU and other `windows.` classes are Windows.
pub fn machine_family_for(resource_class: &str) -> &'static MachineFamily {
    let index = if resource_class.starts_with("windows.gpu.") {
        3
    } else if resource_class.starts_with("gpu.nvidia.") {
        2
    } else if resource_class.starts_with("windows.") {
        1
    } else {
        0
    };
    &MACHINE_FAMILIES[index]
}

/// Xcode versions running on Apple Silicon hosts.
pub const XCODE_APPLE_SILICON_VERSIONS: &[&str] = &[
    "16.0.0", "15.4.0", "15.3.0", "15.2.0", "15.1.0", "15.0.0", "14.3.1", "14.2.0", "14.1.0",
    "14.0.1", "13.4.1",
];

/// Xcode versions still served by Intel hosts.
pub const XCODE_INTEL_VERSIONS: &[&str] = &[
    "13.2.1", "13.1.0", "13.0.0", "12.5.1", "12.4.0", "12.3.0", "12.2.0", "12.1.1", "12.0.1",
    "11.7.0", "11.6.0", "11.5.0", "11.4.1", "11.3.1", "11.2.1", "11.1.0", "11.0.0", "10.3.0",
];

pub const MACOS_APPLE_SILICON_RESOURCE_CLASSES: &[&str] = &[
    "macos.m1.medium.gen1",
    "macos.m1.large.gen1",
    "m2pro.medium",
    "m2pro.large",
    "",
];

pub const MACOS_INTEL_RESOURCE_CLASSES: &[&str] = &[
    "medium",
    "large",
    "macos.x86.medium.gen2",
    "macos.x86.metal.gen1",
    "",
];

/// Returns `true` if the resource class names a self-hosted runner
/// (`namespace/name`).
pub fn is_self_hosted_runner(resource_class: &str) -> bool {
    resource_class.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_built_in_step() {
        assert!(is_built_in_step("checkout"));
        assert!(is_built_in_step("when"));
        assert!(!is_built_in_step("deploy"));
        assert!(!is_built_in_step("node/install"));
    }

    #[test]
    fn test_machine_family_for() {
        assert_eq!(machine_family_for("arm.large").name, "linux");
        assert_eq!(machine_family_for("gpu.nvidia.medium").name, "linux-gpu");
        assert_eq!(machine_family_for("windows.gpu.nvidia.medium").name, "windows-gpu");
        assert_eq!(machine_family_for("windows.large").name, "windows");
        assert_eq!(machine_family_for("").name, "linux");
    }

    #[test]
    fn test_machine_whitelists() {
        assert!(is_machine_resource_class("large"));
        assert!(is_machine_resource_class("windows.medium"));
        assert!(!is_machine_resource_class("huge"));
        assert!(is_machine_image("ubuntu-2204:current"));
        assert!(!is_machine_image("ubuntu-1604:201903-01"));
    }

    #[test]
    fn test_xcode_whitelists() {
        assert!(XCODE_INTEL_VERSIONS.contains(&"11.3.1"));
        assert!(!XCODE_INTEL_VERSIONS.contains(&"12.5"));
        assert!(!XCODE_APPLE_SILICON_VERSIONS.contains(&"12.5"));
        assert!(MACOS_INTEL_RESOURCE_CLASSES.contains(&"large"));
    }

    #[test]
    fn test_is_self_hosted_runner() {
        assert!(is_self_hosted_runner("my-namespace/my-runner"));
        assert!(!is_self_hosted_runner("large"));
    }
}
