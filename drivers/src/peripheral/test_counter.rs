//! Counter peripheral driver.
//!
//! Up to [`NUM_DEVICES`] counters, each exposed as
//! `/dev/test_counter<minor>` with one attribute file per register under
//! `/sys/class/test_counter/test_counter<minor>/`.

use crate::hw::test_counter::MAP;
use crate::regdev::attributes::AttributeSpec;
use crate::regdev::{self, DeviceDescription, Module};
use alloc::sync::Arc;
use common::KResult;
use kernel::Kernel;
use kernel::device::AttrMode;

pub const DRIVER_NAME: &str = "test_counter";
pub const DRIVER_CLASS: &str = "test_counter";
pub const NUM_DEVICES: u32 = 2;

static ATTRIBUTES: [AttributeSpec; 6] = [
    AttributeSpec::register("id", AttrMode::RO, "ID"),
    AttributeSpec::register("rst", AttrMode::WO, "RST"),
    AttributeSpec::register("incr", AttrMode::WO, "INCR"),
    AttributeSpec::register("sample", AttrMode::WO, "SAMPLE"),
    AttributeSpec::register("data", AttrMode::RO, "DATA"),
    AttributeSpec::register("set", AttrMode::WO, "SET"),
];

pub static DESCRIPTION: DeviceDescription = DeviceDescription {
    name: DRIVER_NAME,
    class: DRIVER_CLASS,
    compatible: &["test-counter"],
    map: &MAP,
    attributes: &ATTRIBUTES,
    capacity: NUM_DEVICES,
    minor_suffix: true,
};

pub fn init(kernel: &Arc<Kernel>) -> KResult<Module> {
    regdev::init(kernel, &DESCRIPTION)
}
