/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Captured MegaCLI and smartctl output shared by the service tests
//!
//! Controller 0 has a nested RAID-10 (ld 0, target 0, one disk rebuilding)
//! and a RAID-1 (ld 2, target 2; id 1 is unused). Eight drives: six
//! configured, one unconfigured good in slot 6 and one unconfigured bad in
//! slot 7.

use crate::adapters::ReplayCommandExecutor;
use crate::ports::CommandOutput;

pub const MEGACLI: &str = "megacli";
pub const SMARTCTL: &str = "smartctl";

pub const VERSION: &str = r#"
      MegaCLI SAS RAID Management Tool  Ver 8.07.14 Dec 16, 2013

    (c)Copyright 2013, LSI Corporation, All Rights Reserved.

Exit Code: 0x00
"#;

pub const ADP_ALL_INFO: &str = r#"
Adapter #0

==============================================================================
                    Versions
                ================
Product Name    : PERC H730P Mini
Serial No       : 5AT00PM
FW Package Build: 25.5.5.0005

                HW Configuration
                ================
BBU              : Present
Memory Size      : 2048MB
Temperature sensor for ROC    : Present

ROC temperature : 61  degree Celsius

Exit Code: 0x00
"#;

pub const BBU_STATUS: &str = r#"
BBU status for Adapter: 0

BatteryType: BBU
Voltage: 4073 mV
  Battery Replacement required            : No

Exit Code: 0x00
"#;

pub const PCI_INFO: &str = r#"
PCI information for Controller 0
--------------------------------
Bus Number      : 3
Device Number   : 0
Function Number : 0

Exit Code: 0x00
"#;

pub const LD_ALL: &str = r#"
Adapter 0 -- Virtual Drive Information:
Virtual Drive: 0 (Target Id: 0)
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Virtual Drive: 2 (Target Id: 2)
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0

Exit Code: 0x00
"#;

pub const LD_0: &str = r#"
Adapter 0 -- Virtual Drive Information:
Virtual Drive: 0 (Target Id: 0)
Name                :
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Size                : 557.750 GB
State               : Degraded
Strip Size          : 64 KB
Number Of Drives per span:2
Span Depth          : 2
Current Cache Policy: WriteBack, ReadAdaptive, Direct, No Write Cache if Bad BBU
Disk Cache Policy   : Disabled
Ongoing Progresses:
  Rebuild          : Completed 45%, Taken 12 min.

Exit Code: 0x00
"#;

pub const LD_1_MISSING: &str = r#"
Adapter 0: Virtual Drive 1 Does not Exist.

Exit Code: 0x00
"#;

pub const LD_2: &str = r#"
Adapter 0 -- Virtual Drive Information:
Virtual Drive: 2 (Target Id: 2)
Name                :
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Size                : 446.625 GB
State               : Optimal
Strip Size          : 256 KB
Number Of Drives    : 2
Span Depth          : 1
Current Cache Policy: WriteThrough, ReadAheadNone, Direct, No Write Cache if Bad BBU
Disk Cache Policy   : Enabled

Exit Code: 0x00
"#;

pub const PD_COUNT: &str = r#"
 Number of Physical Drives on Adapter 0: 8

Exit Code: 0x08
"#;

pub const LD_PD_INFO: &str = r#"
Adapter #0

Number of Virtual Disks: 2
Virtual Drive: 0 (Target Id: 0)
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Span Depth          : 2
Span: 0 - Number of PDs: 2

PD: 0 Information
Enclosure Device ID: 32
Slot Number: 0
Device Id: 0
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NV
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :28C (82.40 F)

PD: 1 Information
Enclosure Device ID: 32
Slot Number: 1
Device Id: 1
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Rebuild
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NW
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :30C (86.00 F)

Span: 1 - Number of PDs: 2

PD: 0 Information
Enclosure Device ID: 32
Slot Number: 2
Device Id: 2
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NX
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :29C (84.20 F)

PD: 1 Information
Enclosure Device ID: 32
Slot Number: 3
Device Id: 3
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NY
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :29C (84.20 F)

Virtual Drive: 2 (Target Id: 2)
RAID Level          : Primary-1, Secondary-0, RAID Level Qualifier-0
Span Depth          : 1
Span: 0 - Number of PDs: 2

PD: 0 Information
Enclosure Device ID: 32
Slot Number: 4
Device Id: 4
Coerced Size: 446.625 GB [0x37d40000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: S3Z8NB0K123456      Samsung SSD 860 EVO 500GB               RVT04B6Q
Device Speed: 6.0Gb/s
Media Type: Solid State Device
Drive Temperature :31C (87.80 F)

PD: 1 Information
Enclosure Device ID: 32
Slot Number: 5
Device Id: 5
Coerced Size: 446.625 GB [0x37d40000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: S3Z8NB0K654321      Samsung SSD 860 EVO 500GB               RVT04B6Q
Device Speed: 6.0Gb/s
Media Type: Solid State Device
Drive Temperature :32C (89.60 F)

Exit Code: 0x00
"#;

pub const REBUILD_PROGRESS: &str = r#"
Rebuild Progress on Device at Enclosure 32, Slot 1 Completed 45% in 12 Minutes.

Exit Code: 0x00
"#;

pub const PD_LIST: &str = r#"
Adapter #0

Enclosure Device ID: 32
Slot Number: 0
Drive's position: DiskGroup: 0, Span: 0, Arm: 0
Device Id: 0
Coerced Size: 278.875 GB [0x22dc0000 Sectors]
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NV
Drive Temperature :28C (82.40 F)

Enclosure Device ID: 32
Slot Number: 1
Drive's position: DiskGroup: 0, Span: 0, Arm: 1
Device Id: 1
Firmware state: Rebuild
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NW
Drive Temperature :30C (86.00 F)

Enclosure Device ID: 32
Slot Number: 2
Drive's position: DiskGroup: 0, Span: 1, Arm: 0
Device Id: 2
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NX
Drive Temperature :29C (84.20 F)

Enclosure Device ID: 32
Slot Number: 3
Drive's position: DiskGroup: 0, Span: 1, Arm: 1
Device Id: 3
Firmware state: Online, Spun Up
Inquiry Data: SEAGATE ST300MM0006     LS08S0K2B5NY
Drive Temperature :29C (84.20 F)

Enclosure Device ID: 32
Slot Number: 4
Drive's position: DiskGroup: 1, Span: 0, Arm: 0
Device Id: 4
Firmware state: Online, Spun Up
Inquiry Data: S3Z8NB0K123456      Samsung SSD 860 EVO 500GB               RVT04B6Q
Drive Temperature :31C (87.80 F)

Enclosure Device ID: 32
Slot Number: 5
Drive's position: DiskGroup: 1, Span: 0, Arm: 1
Device Id: 5
Firmware state: Online, Spun Up
Inquiry Data: S3Z8NB0K654321      Samsung SSD 860 EVO 500GB               RVT04B6Q
Drive Temperature :32C (89.60 F)

Enclosure Device ID: 32
Slot Number: 6
Device Id: 6
Coerced Size: 1.817 TB [0xe8d00000 Sectors]
Firmware state: Unconfigured(good), Spun Up
Inquiry Data: ATA     ST2000NM0055-1V4SN04   ZC20ABCD
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :25C (77.00 F)

Enclosure Device ID: 32
Slot Number: 7
Device Id: 7
Coerced Size: 1.817 TB [0xe8d00000 Sectors]
Firmware state: Unconfigured(bad)
Inquiry Data: ATA     ST2000NM0055-1V4SN04   ZC20WXYZ
Device Speed: 6.0Gb/s
Media Type: Hard Disk Device
Drive Temperature :26C (78.80 F)

Exit Code: 0x00
"#;

pub const SCAN_OPEN: &str = r#"/dev/sda -d sat # /dev/sda [SAT], ATA device
/dev/sdb -d sat # /dev/sdb [SAT], ATA device
/dev/bus/0 -d megaraid,6 # /dev/bus/0 [megaraid_disk_06], SCSI device
"#;

pub const SMARTCTL_VERSION: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org
"#;

pub const SDA_INFO: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF INFORMATION SECTION ===
Model Family:     Seagate Exos 7E8
Device Model:     ST2000NM0055-1V4104
Serial Number:    ZC20ABCD
Firmware Version: SN04
User Capacity:    2,000,398,934,016 bytes [2.00 TB]
SMART support is: Available - device has SMART capability.
SMART support is: Enabled
"#;

pub const SDA_HEALTH: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF READ SMART DATA SECTION ===
SMART overall-health self-assessment test result: PASSED
"#;

pub const SDA_ATTRIBUTES: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF READ SMART DATA SECTION ===
SMART Attributes Data Structure revision number: 10
Vendor Specific SMART Attributes with Thresholds:
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  1 Raw_Read_Error_Rate     0x000f   083   064   044    Pre-fail  Always       -       204227216
  9 Power_On_Hours          0x0032   064   064   000    Old_age   Always       -       31962
190 Airflow_Temperature_Cel 0x0022   064   055   040    Old_age   Always       -       36 (Min/Max 24/40)
200 Pressure_Limit          0x0023   100   100   001    Pre-fail  Always       -       0
"#;

pub const SDA_XERROR: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF READ SMART DATA SECTION ===
SMART Extended Comprehensive Error Log Version: 1 (5 sectors)
Device Error Count: 3
        CR     = Command Register
Error 3 [2] occurred at disk power-on lifetime: 31900 hours (1329 days + 4 hours)
  When the command that caused the error occurred, the device was active or idle.
"#;

pub const BUS0_INFO: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF INFORMATION SECTION ===
Vendor:               SEAGATE
Product:              ST300MM0006
Revision:             LS08
Logical Unit id:      0x5000c500a1b2c3d4
Serial number:        S0K2B5NV
SMART support is:     Available - device has SMART capability.
SMART support is:     Enabled
"#;

pub const BUS0_HEALTH: &str = r#"smartctl 7.2 2020-12-30 r5155 [x86_64-linux-5.15.0-91-generic] (local build)
Copyright (C) 2002-20, Bruce Allen, Christian Franke, www.smartmontools.org

=== START OF READ SMART DATA SECTION ===
SMART Health Status: OK
"#;

/// Every MegaCLI command a one-controller collection run issues
pub fn megaraid_host() -> ReplayCommandExecutor {
    ReplayCommandExecutor::new()
        .with_stdout(MEGACLI, "-v", VERSION)
        .with_output(
            MEGACLI,
            "-adpCount -NoLog",
            CommandOutput::with_exit_code("\nController Count: 1.\n\nExit Code: 0x01\n", 1),
        )
        .with_stdout(MEGACLI, "-AdpAllInfo -a0 -NoLog", ADP_ALL_INFO)
        .with_stdout(MEGACLI, "-AdpBbuCmd -GetBbuStatus -a0 -NoLog", BBU_STATUS)
        .with_stdout(MEGACLI, "-AdpGetPciInfo -a0 -NoLog", PCI_INFO)
        .with_stdout(MEGACLI, "-LDInfo -Lall -a0 -NoLog", LD_ALL)
        .with_stdout(MEGACLI, "-LDInfo -L0 -a0 -NoLog", LD_0)
        .with_stdout(MEGACLI, "-LDInfo -L1 -a0 -NoLog", LD_1_MISSING)
        .with_stdout(MEGACLI, "-LDInfo -L2 -a0 -NoLog", LD_2)
        .with_output(
            MEGACLI,
            "-PDGetNum -a0 -NoLog",
            CommandOutput::with_exit_code(PD_COUNT, 8),
        )
        .with_stdout(MEGACLI, "-LdPdInfo -a0 -NoLog", LD_PD_INFO)
        .with_stdout(
            MEGACLI,
            "-PDRbld -ShowProg -PhysDrv[32:1] -a0 -NoLog",
            REBUILD_PROGRESS,
        )
        .with_stdout(MEGACLI, "-PDList -a0 -NoLog", PD_LIST)
}

/// Every smartctl command a collection run issues, on top of `executor`
///
/// `/dev/sdb` is in standby and must not be queried past the active check.
pub fn smart_host(executor: ReplayCommandExecutor) -> ReplayCommandExecutor {
    executor
        .with_stdout(SMARTCTL, "-V", SMARTCTL_VERSION)
        .with_stdout(SMARTCTL, "--scan-open", SCAN_OPEN)
        .with_stdout(SMARTCTL, "--nocheck standby --device sat /dev/sda", "")
        .with_output(
            SMARTCTL,
            "--nocheck standby --device sat /dev/sdb",
            CommandOutput::with_exit_code("Device is in STANDBY mode, exit(2)\n", 2),
        )
        .with_stdout(SMARTCTL, "--nocheck standby --device megaraid,6 /dev/bus/0", "")
        .with_stdout(SMARTCTL, "--info --device sat /dev/sda", SDA_INFO)
        .with_stdout(SMARTCTL, "--health --device sat /dev/sda", SDA_HEALTH)
        .with_stdout(SMARTCTL, "--attributes --device sat /dev/sda", SDA_ATTRIBUTES)
        .with_stdout(SMARTCTL, "-l xerror,1 --device sat /dev/sda", SDA_XERROR)
        .with_stdout(SMARTCTL, "--info --device megaraid,6 /dev/bus/0", BUS0_INFO)
        .with_stdout(SMARTCTL, "--health --device megaraid,6 /dev/bus/0", BUS0_HEALTH)
}
