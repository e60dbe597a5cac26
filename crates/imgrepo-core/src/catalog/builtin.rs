//! Well-known cloud images shipped with the binary.
//!
//! Only upstreams that publish a SHA-256 `<digest>  <filename>` manifest get a
//! `checksum_url`; Debian and Alpine publish SHA-512 only, so their images are
//! accepted unverified.

use super::entry::{ArtifactKind, CatalogEntry};

struct Builtin {
    id: &'static str,
    name: &'static str,
    url: &'static str,
    checksum_url: Option<&'static str>,
    manifest_alias: Option<&'static str>,
    os_family: &'static str,
    version: &'static str,
    arch: &'static str,
    kind: ArtifactKind,
}

const BUILTIN: &[Builtin] = &[
    Builtin {
        id: "ubuntu-24.04",
        name: "Ubuntu 24.04 LTS (Noble Numbat)",
        url: "https://cloud-images.ubuntu.com/releases/24.04/release/ubuntu-24.04-server-cloudimg-amd64.img",
        checksum_url: Some("https://cloud-images.ubuntu.com/releases/24.04/release/SHA256SUMS"),
        manifest_alias: Some("server-cloudimg-amd64.img"),
        os_family: "ubuntu",
        version: "24.04",
        arch: "x86_64",
        kind: ArtifactKind::Img,
    },
    Builtin {
        id: "ubuntu-24.04-arm64",
        name: "Ubuntu 24.04 LTS (Noble Numbat) arm64",
        url: "https://cloud-images.ubuntu.com/releases/24.04/release/ubuntu-24.04-server-cloudimg-arm64.img",
        checksum_url: Some("https://cloud-images.ubuntu.com/releases/24.04/release/SHA256SUMS"),
        manifest_alias: Some("server-cloudimg-arm64.img"),
        os_family: "ubuntu",
        version: "24.04",
        arch: "aarch64",
        kind: ArtifactKind::Img,
    },
    Builtin {
        id: "ubuntu-22.04",
        name: "Ubuntu 22.04 LTS (Jammy Jellyfish)",
        url: "https://cloud-images.ubuntu.com/releases/22.04/release/ubuntu-22.04-server-cloudimg-amd64.img",
        checksum_url: Some("https://cloud-images.ubuntu.com/releases/22.04/release/SHA256SUMS"),
        manifest_alias: Some("server-cloudimg-amd64.img"),
        os_family: "ubuntu",
        version: "22.04",
        arch: "x86_64",
        kind: ArtifactKind::Img,
    },
    Builtin {
        id: "debian-12",
        name: "Debian 12 (Bookworm) generic cloud",
        url: "https://cloud.debian.org/images/cloud/bookworm/latest/debian-12-genericcloud-amd64.qcow2",
        checksum_url: None,
        manifest_alias: None,
        os_family: "debian",
        version: "12",
        arch: "x86_64",
        kind: ArtifactKind::Qcow2,
    },
    Builtin {
        id: "alpine-3.22",
        name: "Alpine Linux 3.22 (nocloud, BIOS)",
        url: "https://dl-cdn.alpinelinux.org/alpine/v3.22/releases/cloud/nocloud_alpine-3.22.0-x86_64-bios-cloudinit-r0.qcow2",
        checksum_url: None,
        manifest_alias: None,
        os_family: "alpine",
        version: "3.22",
        arch: "x86_64",
        kind: ArtifactKind::Qcow2,
    },
];

pub(super) fn entries() -> Vec<CatalogEntry> {
    BUILTIN
        .iter()
        .map(|b| CatalogEntry {
            id: b.id.to_string(),
            name: b.name.to_string(),
            url: b.url.to_string(),
            checksum_url: b.checksum_url.map(str::to_string),
            manifest_alias: b.manifest_alias.map(str::to_string),
            size_bytes: None,
            os_family: b.os_family.to_string(),
            version: b.version.to_string(),
            arch: b.arch.to_string(),
            kind: b.kind,
        })
        .collect()
}
