//! Integration tests for the concrete scenarios (S1-S6) and cross-module
//! properties from SPEC_FULL.md §8.

use ecs150fs::{format::format_image, FileSystem, FsError};
use tempfile::NamedTempFile;

fn image(total_blocks: u16) -> NamedTempFile {
    let f = NamedTempFile::new().unwrap();
    format_image(f.path(), total_blocks).unwrap();
    f
}

#[test]
fn s1_empty_read() {
    let disk = image(19); // 16 data blocks + superblock + fat + root dir
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);
    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn s2_cross_block_write() {
    let disk = image(100);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("b").unwrap();
    let fd = fs.open("b").unwrap();

    let pattern = vec![0xABu8; 5000];
    assert_eq!(fs.write(fd, &pattern).unwrap(), 5000);
    assert_eq!(fs.stat(fd).unwrap(), 5000);

    fs.lseek(fd, 0).unwrap();
    let mut out = vec![0u8; 5000];
    assert_eq!(fs.read(fd, &mut out).unwrap(), 5000);
    assert_eq!(out, pattern);

    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn s3_partial_overwrite() {
    let disk = image(100);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("b").unwrap();
    let fd = fs.open("b").unwrap();
    fs.write(fd, &vec![0xABu8; 5000]).unwrap();

    fs.lseek(fd, 4090).unwrap();
    assert_eq!(fs.write(fd, b"HELLO!").unwrap(), 6);
    assert_eq!(fs.stat(fd).unwrap(), 5000);

    fs.lseek(fd, 4088).unwrap();
    let mut out = [0u8; 10];
    assert_eq!(fs.read(fd, &mut out).unwrap(), 10);
    assert_eq!(&out[..2], &[0xAB, 0xAB]);
    assert_eq!(&out[2..8], b"HELLO!");
    assert_eq!(&out[8..], &[0xAB, 0xAB]);

    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn s4_disk_full() {
    // superblock + 1 fat block + root dir + 5 data blocks = 8 blocks;
    // data block 0 is reserved, leaving 4 allocatable blocks.
    let disk = image(8);
    let mut fs = FileSystem::mount(disk.path()).unwrap();

    fs.create("c").unwrap();
    let fd_c = fs.open("c").unwrap();
    assert_eq!(fs.write(fd_c, &vec![0u8; 4 * 4096]).unwrap(), 4 * 4096);

    fs.create("d").unwrap();
    let fd_d = fs.open("d").unwrap();
    assert_eq!(fs.write(fd_d, &vec![0u8; 4096]).unwrap(), 0);
    assert_eq!(fs.stat(fd_d).unwrap(), 0);

    fs.close(fd_c).unwrap();
    fs.close(fd_d).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn s5_delete_reclaims() {
    let disk = image(8);
    let mut fs = FileSystem::mount(disk.path()).unwrap();

    fs.create("c").unwrap();
    let fd_c = fs.open("c").unwrap();
    fs.write(fd_c, &vec![0u8; 4 * 4096]).unwrap();
    fs.close(fd_c).unwrap();

    fs.delete("c").unwrap();
    assert_eq!(fs.info().free_data_blocks, 4);

    fs.create("c2").unwrap();
    let fd = fs.open("c2").unwrap();
    assert_eq!(fs.write(fd, &vec![7u8; 3 * 4096]).unwrap(), 3 * 4096);
    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn s6_busy_delete() {
    let disk = image(19);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("e").unwrap();
    let fd = fs.open("e").unwrap();

    assert!(matches!(fs.delete("e"), Err(FsError::Busy)));

    fs.close(fd).unwrap();
    fs.delete("e").unwrap();
    fs.unmount().unwrap();
}

#[test]
fn round_trip_arbitrary_bytes() {
    let disk = image(40);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("r").unwrap();
    let fd = fs.open("r").unwrap();

    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(fs.write(fd, &data).unwrap(), data.len());
    fs.lseek(fd, 0).unwrap();
    let mut out = vec![0u8; data.len()];
    assert_eq!(fs.read(fd, &mut out).unwrap(), data.len());
    assert_eq!(out, data);

    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn persistence_across_mounts() {
    let disk = image(40);
    {
        let mut fs = FileSystem::mount(disk.path()).unwrap();
        fs.create("p").unwrap();
        let fd = fs.open("p").unwrap();
        fs.write(fd, b"durable bytes").unwrap();
        fs.close(fd).unwrap();
        fs.unmount().unwrap();
    }

    let mut fs = FileSystem::mount(disk.path()).unwrap();
    let listing = fs.ls();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "p");
    assert_eq!(listing[0].size, 13);

    let fd = fs.open("p").unwrap();
    let mut out = vec![0u8; 13];
    assert_eq!(fs.read(fd, &mut out).unwrap(), 13);
    assert_eq!(&out, b"durable bytes");
    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn create_delete_is_idempotent_on_disk_contents() {
    let disk = image(40);
    let before = std::fs::read(disk.path()).unwrap();

    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("tmp").unwrap();
    fs.delete("tmp").unwrap();
    fs.unmount().unwrap();

    let after = std::fs::read(disk.path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn boundary_write_at_size_extends_and_read_at_size_is_empty() {
    let disk = image(40);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("b").unwrap();
    let fd = fs.open("b").unwrap();

    fs.write(fd, b"hello").unwrap();
    assert_eq!(fs.stat(fd).unwrap(), 5);

    fs.lseek(fd, 5).unwrap();
    assert_eq!(fs.write(fd, b" world").unwrap(), 6);
    assert_eq!(fs.stat(fd).unwrap(), 11);

    let mut out = [0u8; 8];
    assert_eq!(fs.read(fd, &mut out).unwrap(), 0);

    fs.close(fd).unwrap();
    fs.unmount().unwrap();
}

#[test]
fn directory_capacity_is_128_files() {
    let disk = image(300);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    for i in 0..128 {
        fs.create(&format!("f{i}")).unwrap();
    }
    assert!(matches!(fs.create("one_too_many"), Err(FsError::TableFull)));
    fs.unmount().unwrap();
}

#[test]
fn open_table_capacity_is_32_descriptors() {
    let disk = image(40);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("shared").unwrap();

    let mut fds = Vec::new();
    for _ in 0..32 {
        fds.push(fs.open("shared").unwrap());
    }
    assert!(matches!(fs.open("shared"), Err(FsError::TableFull)));

    for fd in fds {
        fs.close(fd).unwrap();
    }
    fs.unmount().unwrap();
}

#[test]
fn mount_rejects_bad_signature() {
    let f = NamedTempFile::new().unwrap();
    std::fs::write(f.path(), vec![0u8; 4096 * 10]).unwrap();
    assert!(FileSystem::mount(f.path()).is_err());
}

#[test]
fn unmount_rejects_open_descriptors() {
    let disk = image(19);
    let mut fs = FileSystem::mount(disk.path()).unwrap();
    fs.create("a").unwrap();
    let _fd = fs.open("a").unwrap();
    assert!(matches!(fs.unmount(), Err(FsError::Busy)));
}
