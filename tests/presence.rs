mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use rtsx::rtsx::constant::*;
use rtsx::rtsx::{ChipFeatures, MmcCommand, MmcRequest, WaitChannel};
use rtsx::SdError;

fn empty_socket() -> Rig {
    let chip = FakeChip::new();
    chip.remove();
    let rig = rig_with(0x5227, 16 * 1024, chip);
    rig.host.init().unwrap();
    rig
}

#[test]
fn card_seated_at_boot_is_attached() {
    let rig = rig();
    assert_eq!(rig.platform.attached(), 1);
    assert!(rig.platform.scheduled().is_empty());
}

#[test]
fn insertion_is_debounced() {
    let rig = empty_socket();
    assert_eq!(rig.platform.attached(), 0);

    rig.chip.insert();
    rig.host.handle_interrupt();
    assert_eq!(rig.platform.scheduled(), [Some(Duration::from_secs(1))]);
    assert_eq!(rig.platform.attached(), 0);

    rig.host.card_task();
    assert_eq!(rig.platform.attached(), 1);

    let mut req = MmcRequest::new(MmcCommand::new(13, 0, MMC_RSP_R1));
    assert_eq!(rig.host.submit_request(&mut req), Ok(()));
}

#[test]
fn bounce_inside_debounce_window_attaches_nothing() {
    let rig = empty_socket();

    rig.chip.insert();
    rig.host.handle_interrupt();
    rig.chip.remove();
    rig.host.handle_interrupt();

    // the deferred run sees an empty socket
    rig.host.card_task();
    assert_eq!(rig.platform.attached(), 0);
    assert_eq!(rig.platform.detached(), 0);
}

#[test]
fn removal_detaches_at_once() {
    let rig = rig();

    rig.chip.remove();
    rig.host.handle_interrupt();
    assert_eq!(rig.platform.scheduled(), [None]);

    rig.host.card_task();
    assert_eq!(rig.platform.detached(), 1);

    let mut req = MmcRequest::new(MmcCommand::new(13, 0, MMC_RSP_R1));
    assert_eq!(rig.host.submit_request(&mut req), Err(SdError::InvalidState));

    // a second run finds nothing left to detach
    rig.host.card_task();
    assert_eq!(rig.platform.detached(), 1);
}

#[test]
fn write_protect_follows_interrupt_status() {
    let rig = rig();
    assert!(!rig.host.get_read_only());

    rig.chip.set_write_protect(true);
    rig.chip.insert();
    rig.host.handle_interrupt();
    assert!(rig.host.get_read_only());
}

#[test]
fn spurious_interrupt_is_ignored() {
    let rig = rig();
    let wakeups = rig.platform.wakeups();

    rig.host.handle_interrupt();
    assert!(rig.platform.scheduled().is_empty());
    assert_eq!(rig.platform.wakeups(), wakeups);
}

#[test]
fn interrupt_without_request_does_not_wake() {
    let rig = rig();
    let wakeups = rig.platform.wakeups();

    rig.chip.insert();
    rig.host.handle_interrupt();
    assert_eq!(rig.platform.wakeups(), wakeups);
}

#[test]
fn shutdown_detaches_once_and_drains() {
    let rig = rig();

    rig.host.shutdown();
    assert_eq!(rig.platform.detached(), 1);
    assert_eq!(rig.platform.drained(), 1);

    rig.host.shutdown();
    assert_eq!(rig.platform.detached(), 1);
    assert_eq!(rig.platform.drained(), 2);
}

#[test]
fn suspend_refused_during_request() {
    let rig = rig();
    let result = Arc::new(Mutex::new(None));

    let host = Arc::downgrade(&rig.host);
    let slot = result.clone();
    rig.platform.on_next_sleep(move || {
        *slot.lock().unwrap() = Some(host.upgrade().unwrap().suspend());
    });

    let mut req = MmcRequest::new(MmcCommand::new(13, 0, MMC_RSP_R1));
    assert_eq!(rig.host.submit_request(&mut req), Ok(()));
    assert_eq!(*result.lock().unwrap(), Some(Err(SdError::Busy)));

    assert_eq!(rig.host.suspend(), Ok(()));
}

#[test]
fn resume_reprograms_the_chip() {
    let chip = FakeChip::new();
    chip.set_cfg(RTSX_SDIOCFG_REG, RTSX_SDIOCFG_SDIO_ONLY);
    let rig = rig_with(0x5227, 16 * 1024, chip);
    rig.host.init().unwrap();

    rig.host.suspend().unwrap();
    rig.chip.clear_writes();
    rig.host.resume().unwrap();

    assert!(rig.chip.wrote(RTSX_FPDCTL));
    assert!(rig.chip.wrote(RTSX_CARD_DRIVE_SEL));
    assert!(rig.host.features().contains(ChipFeatures::SDIO));

    let mut req = MmcRequest::new(MmcCommand::new(13, 0, MMC_RSP_R1));
    assert_eq!(rig.host.submit_request(&mut req), Ok(()));
}

#[test]
fn bus_ownership_blocks_until_released() {
    let rig = rig();
    rig.host.acquire();

    let host = Arc::downgrade(&rig.host);
    rig.platform.on_next_sleep(move || host.upgrade().unwrap().release());
    rig.host.acquire();

    assert!(rig
        .platform
        .sleeps()
        .iter()
        .any(|(chan, timeout)| *chan == WaitChannel::HostBus && timeout.is_none()));
    rig.host.release();
}
