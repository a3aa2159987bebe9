//! IOb timer driver.
//!
//! Single instance at `/dev/iob_timer`. Besides one attribute file per
//! register, `clocks` reports the last sampled 64-bit count.

use crate::hw::iob_timer::MAP;
use crate::regdev::attributes::AttributeSpec;
use crate::regdev::{self, DeviceDescription, Module};
use alloc::sync::Arc;
use common::KResult;
use kernel::Kernel;
use kernel::device::AttrMode;

pub const DRIVER_NAME: &str = "iob_timer";
pub const DRIVER_CLASS: &str = "iob_class";

static ATTRIBUTES: [AttributeSpec; 7] = [
    AttributeSpec::register("reset", AttrMode::WO, "RESET"),
    AttributeSpec::register("enable", AttrMode::WO, "ENABLE"),
    AttributeSpec::register("sample", AttrMode::WO, "SAMPLE"),
    AttributeSpec::register("data_low", AttrMode::RO, "DATA_LOW"),
    AttributeSpec::register("data_high", AttrMode::RO, "DATA_HIGH"),
    AttributeSpec::register("version", AttrMode::RO, "VERSION"),
    AttributeSpec::wide("clocks", "DATA_LOW", "DATA_HIGH"),
];

pub static DESCRIPTION: DeviceDescription = DeviceDescription {
    name: DRIVER_NAME,
    class: DRIVER_CLASS,
    compatible: &["iobundle,timer0"],
    map: &MAP,
    attributes: &ATTRIBUTES,
    capacity: 1,
    minor_suffix: false,
};

pub fn init(kernel: &Arc<Kernel>) -> KResult<Module> {
    regdev::init(kernel, &DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::regs::Width;
    use crate::hw::iob_timer::{
        REG_DATA_HIGH, REG_DATA_LOW, REG_ENABLE, REG_SAMPLE, REG_VERSION, WINDOW_SIZE,
    };
    use crate::sim::{IoOp, SIM_TIMER_VERSION, SimMapper, SimTimer};
    use common::Errno;
    use kernel::fs::{File, SeekWhence};
    use kernel::io::IoMapper;
    use kernel::platform::{PlatformDeviceInfo, Resource};

    const BASE: usize = 0x4100_0000;
    const DIR: &str = "/sys/class/iob_class/iob_timer";

    fn setup() -> (Arc<Kernel>, Module, Arc<SimTimer>) {
        let mapper = Arc::new(SimMapper::new());
        let sim = Arc::new(SimTimer::new());
        mapper.place(BASE, WINDOW_SIZE, sim.clone());
        mapper.place(BASE + 0x100, WINDOW_SIZE, Arc::new(SimTimer::new()));
        let kernel = Kernel::new(mapper as Arc<dyn IoMapper>);
        let module = init(&kernel).unwrap();
        (kernel, module, sim)
    }

    fn timer(name: &str, base: usize) -> PlatformDeviceInfo {
        PlatformDeviceInfo::new(name, "iobundle,timer0").with_resource(Resource::mem(base, WINDOW_SIZE))
    }

    fn write_byte(file: &mut File, addr: usize, value: u8) {
        file.llseek(addr as i64, SeekWhence::Start).unwrap();
        assert_eq!(file.write(&[value]), Ok(1));
    }

    #[test]
    fn node_and_attribute_files_are_created() {
        let (kernel, _module, _sim) = setup();
        kernel.platform_device_register(timer("timer@0", BASE)).unwrap();

        assert!(kernel.devfs().lookup("iob_timer").is_some());
        let mut names = kernel.sysfs().list(DIR).unwrap();
        names.sort();
        assert_eq!(
            names,
            [
                "clocks",
                "data_high",
                "data_low",
                "dev",
                "enable",
                "reset",
                "sample",
                "version"
            ]
        );
    }

    #[test]
    fn sampled_count_reads_back_through_the_file() {
        let (kernel, _module, sim) = setup();
        kernel.platform_device_register(timer("timer@0", BASE)).unwrap();
        let mut file = kernel.open("/dev/iob_timer").unwrap();

        write_byte(&mut file, REG_ENABLE, 1);
        sim.advance(0x1_0000_0002);
        write_byte(&mut file, REG_SAMPLE, 1);

        let mut word = [0u8; 4];
        file.llseek(REG_DATA_LOW as i64, SeekWhence::Start).unwrap();
        assert_eq!(file.read(&mut word), Ok(4));
        assert_eq!(u32::from_le_bytes(word), 2);
        // reads advance the offset straight onto DATA_HIGH
        assert_eq!(file.pos(), REG_DATA_HIGH as i64);
        assert_eq!(file.read(&mut word), Ok(4));
        assert_eq!(u32::from_le_bytes(word), 1);

        file.llseek(REG_VERSION as i64, SeekWhence::Start).unwrap();
        assert_eq!(file.read(&mut word), Ok(2));
        assert_eq!(u16::from_le_bytes([word[0], word[1]]), SIM_TIMER_VERSION);
        let version = sim.accesses().into_iter().rfind(|a| a.op == IoOp::Read);
        assert_eq!(version.map(|a| a.width), Some(Width::W16));
    }

    #[test]
    fn clocks_combines_both_data_words() {
        let (kernel, _module, sim) = setup();
        kernel.platform_device_register(timer("timer@0", BASE)).unwrap();
        let sysfs = kernel.sysfs();

        sysfs.write(&alloc::format!("{}/enable", DIR), "1").unwrap();
        sim.advance(0x3_0000_0010);
        sysfs.write(&alloc::format!("{}/sample", DIR), "1").unwrap();

        assert_eq!(
            sysfs.read(&alloc::format!("{}/clocks", DIR)).unwrap(),
            alloc::format!("{}\n", 0x3_0000_0010u64)
        );
        assert_eq!(sysfs.read(&alloc::format!("{}/data_high", DIR)).unwrap(), "3\n");
        assert_eq!(
            sysfs.read(&alloc::format!("{}/version", DIR)).unwrap(),
            alloc::format!("{}\n", SIM_TIMER_VERSION)
        );
        assert_eq!(
            sysfs.write(&alloc::format!("{}/clocks", DIR), "0"),
            Err(Errno::Access)
        );

        sysfs.write(&alloc::format!("{}/reset", DIR), "1").unwrap();
        sysfs.write(&alloc::format!("{}/reset", DIR), "0").unwrap();
        sysfs.write(&alloc::format!("{}/sample", DIR), "1").unwrap();
        assert_eq!(sysfs.read(&alloc::format!("{}/clocks", DIR)).unwrap(), "0\n");
    }

    #[test]
    fn single_instance_rejects_a_second_timer() {
        let (kernel, module, _sim) = setup();
        kernel.platform_device_register(timer("timer@0", BASE)).unwrap();
        assert_eq!(
            kernel.platform_device_register(timer("timer@1", BASE + 0x100)).err(),
            Some(Errno::NoDev)
        );
        assert_eq!(module.driver().registry().len(), 1);
        assert_eq!(kernel.iomem_regions().len(), 1);
    }

    #[test]
    fn non_matching_devices_are_left_alone() {
        let (kernel, module, _sim) = setup();
        let other = PlatformDeviceInfo::new("uart@0", "arm,pl011")
            .with_resource(Resource::mem(BASE, WINDOW_SIZE));
        let pdev = kernel.platform_device_register(other).unwrap();
        assert!(!pdev.is_bound());
        assert!(module.driver().registry().is_empty());
    }
}
