//! Integration tests for memscan-core
//!
//! These tests drive the public scan API against the mock reader, covering
//! request validation, alignment, range boundaries and unreadable memory.

use memscan_core::process::{MockMemoryBuilder, MockMemoryReader, RegionInventory};
use memscan_core::scan::compat::{INVALID_ADDRESS, find_in_memory_raw};
use memscan_core::{AddressRange, CancellationToken, MemoryScanner, ScanConfig, ScanError};

/// 16 bytes at 0x1000 with "AB" at 0x1008.
fn ab_reader() -> MockMemoryReader {
    MockMemoryBuilder::new()
        .with_size(16)
        .write_bytes(8, b"AB")
        .build()
}

const AB_RANGE: AddressRange = AddressRange::new(0x1000, 16);

mod validation_tests {
    use super::*;

    #[test]
    fn test_empty_pattern_regardless_of_other_inputs() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        for (range, alignment) in [
            (AB_RANGE, 1),
            (AB_RANGE, 0),
            (AddressRange::default(), 1),
            (AddressRange::default(), 0),
        ] {
            assert_eq!(
                scanner.find(b"", range, alignment),
                Err(ScanError::EmptyPattern)
            );
        }
    }

    #[test]
    fn test_zero_alignment() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"AB", AB_RANGE, 0),
            Err(ScanError::InvalidAlignment)
        );
    }

    #[test]
    fn test_zero_size_and_default_ranges() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"AB", AddressRange::new(0x1000, 0), 1),
            Err(ScanError::InvalidRange {
                base: 0x1000,
                size: 0
            })
        );
        assert_eq!(
            scanner.find(b"AB", AddressRange::default(), 1),
            Err(ScanError::InvalidRange { base: 0, size: 0 })
        );
    }

    #[test]
    fn test_rejection_performs_no_reads() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        let _ = scanner.find(b"", AB_RANGE, 1);
        let _ = scanner.find(b"AB", AddressRange::default(), 1);
        let _ = scanner.find(b"AB", AB_RANGE, 0);
        let _ = scanner.find(b"AB", AddressRange::new(u64::MAX - 1, 8), 1);

        assert_eq!(reader.read_count(), 0);
    }
}

mod alignment_tests {
    use super::*;

    #[test]
    fn test_alignment_one() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"AB", AB_RANGE, 1), Ok(Some(0x1008)));
    }

    #[test]
    fn test_alignment_eight() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"AB", AB_RANGE, 8), Ok(Some(0x1008)));
    }

    #[test]
    fn test_alignment_sixteen_not_found() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"AB", AB_RANGE, 16), Ok(None));
    }

    #[test]
    fn test_lowest_address_wins() {
        let reader = MockMemoryBuilder::new()
            .with_size(16)
            .write_bytes(2, b"XY")
            .write_bytes(10, b"XY")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"XY", AB_RANGE, 2), Ok(Some(0x1002)));
    }

    #[test]
    fn test_unaligned_match_needs_relaxed_alignment() {
        // Only occurrence is at 0x1006: 2-aligned, not 4- or 8-aligned.
        let reader = MockMemoryBuilder::new()
            .with_size(32)
            .write_bytes(6, b"\xDE\xAD\xBE\xEF")
            .build();
        let scanner = MemoryScanner::new(&reader);
        let range = AddressRange::new(0x1000, 32);
        let pattern = b"\xDE\xAD\xBE\xEF";

        assert_eq!(scanner.find(pattern, range, 8), Ok(None));
        assert_eq!(scanner.find(pattern, range, 4), Ok(None));
        assert_eq!(scanner.find(pattern, range, 2), Ok(Some(0x1006)));
        assert_eq!(scanner.find(pattern, range, 1), Ok(Some(0x1006)));
    }

    #[test]
    fn test_found_address_is_aligned_and_in_range() {
        let mut builder = MockMemoryBuilder::new().base(0x7000).with_size(512);
        for offset in [3usize, 17, 64, 129, 200, 333, 480] {
            builder = builder.write_bytes(offset, b"zz");
        }
        let reader = builder.build();
        let scanner = MemoryScanner::new(&reader).with_config(ScanConfig::new(32, 4096));

        let mut found = 0;
        for alignment in [1u64, 2, 3, 4, 8, 16, 32, 64] {
            for (base, size) in [(0x7000, 512), (0x7004, 300), (0x7041, 100), (0x7100, 256)] {
                let range = AddressRange::new(base, size);
                if let Ok(Some(address)) = scanner.find(b"zz", range, alignment) {
                    assert_eq!(address % alignment, 0);
                    assert!(address >= range.base);
                    assert!(address + 2 <= range.base + range.size);
                    found += 1;
                }
            }
        }
        assert!(found > 0);

        // 0x7040 is the only 64-aligned occurrence.
        assert_eq!(
            scanner.find(b"zz", AddressRange::new(0x7000, 512), 64),
            Ok(Some(0x7040))
        );
        assert_eq!(
            scanner.find(b"zz", AddressRange::new(0x7000, 512), 1),
            Ok(Some(0x7003))
        );
    }

    #[test]
    fn test_result_independent_of_chunk_size() {
        let reader = MockMemoryBuilder::new()
            .with_size(1024)
            .write_bytes(511, b"pattern!")
            .write_bytes(700, b"pattern!")
            .write_bytes(1000, b"pattern!")
            .build();
        let range = AddressRange::new(0x1000, 1024);

        let expected: Vec<_> = [1u64, 4, 8]
            .iter()
            .map(|&a| MemoryScanner::new(&reader).find(b"pattern!", range, a))
            .collect();
        assert_eq!(expected, vec![Ok(Some(0x11FF)), Ok(Some(0x12BC)), Ok(Some(0x13E8))]);

        for chunk_size in [16, 23, 64, 255, 1024, 1 << 20] {
            let scanner = MemoryScanner::new(&reader).with_config(ScanConfig::new(chunk_size, 64));
            let actual: Vec<_> = [1u64, 4, 8]
                .iter()
                .map(|&a| scanner.find(b"pattern!", range, a))
                .collect();
            assert_eq!(actual, expected, "chunk size {}", chunk_size);
        }
    }
}

mod boundary_tests {
    use super::*;

    #[test]
    fn test_match_in_last_bytes_of_range() {
        let reader = MockMemoryBuilder::new()
            .with_size(32)
            .write_bytes(14, b"END")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"END", AddressRange::new(0x1000, 17), 1),
            Ok(Some(0x100E))
        );
    }

    #[test]
    fn test_match_past_range_end_ignored() {
        let reader = MockMemoryBuilder::new()
            .with_size(32)
            .write_bytes(14, b"END")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"END", AddressRange::new(0x1000, 16), 1), Ok(None));
    }

    #[test]
    fn test_match_before_range_base_ignored() {
        let reader = MockMemoryBuilder::new()
            .with_size(32)
            .write_bytes(2, b"HEAD")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"HEAD", AddressRange::new(0x1003, 20), 1), Ok(None));
        assert_eq!(
            scanner.find(b"HEAD", AddressRange::new(0x1002, 4), 1),
            Ok(Some(0x1002))
        );
    }

    #[test]
    fn test_pattern_longer_than_range() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(scanner.find(b"ABC", AddressRange::new(0x1008, 2), 1), Ok(None));
    }
}

mod unreadable_tests {
    use super::*;

    #[test]
    fn test_gap_then_match() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x3000)
            .unreadable(0, 0x2000)
            .write_bytes(0x2010, b"found me")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"found me", AddressRange::new(0x1000, 0x3000), 8),
            Ok(Some(0x3010))
        );
    }

    #[test]
    fn test_range_starting_in_unmapped_memory() {
        let reader = MockMemoryBuilder::new()
            .base(0x10000)
            .with_size(0x100)
            .write_bytes(0x80, b"tail")
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"tail", AddressRange::new(0x8000, 0x8100), 1),
            Ok(Some(0x10080))
        );
    }

    #[test]
    fn test_several_holes_with_short_reads() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x400)
            .page_size(0x40)
            .unreadable(0x40, 0x40)
            .unreadable(0x100, 0xC0)
            .write_bytes(0x1FE, b"XYZW")
            .build();

        for chunk_size in [16, 100, 4096] {
            let scanner =
                MemoryScanner::new(&reader).with_config(ScanConfig::new(chunk_size, 0x40));
            assert_eq!(
                scanner.find(b"XYZW", AddressRange::new(0x1000, 0x400), 2),
                Ok(Some(0x11FE))
            );
        }
    }

    #[test]
    fn test_short_readable_tail_is_not_found() {
        let reader = MockMemoryBuilder::new()
            .with_size(8)
            .unreadable(0, 6)
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"ABC", AddressRange::new(0x1000, 8), 1),
            Ok(None)
        );
    }

    #[test]
    fn test_entirely_unreadable_range() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"AB", AddressRange::new(0x50000, 0x1000), 1),
            Err(ScanError::Unreadable {
                base: 0x50000,
                size: 0x1000
            })
        );
    }

    #[test]
    fn test_readable_but_absent_is_not_found() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x100)
            .unreadable(0x10, 0xF0)
            .build();
        let scanner = MemoryScanner::new(&reader);

        assert_eq!(
            scanner.find(b"AB", AddressRange::new(0x1000, 0x100), 1),
            Ok(None)
        );
    }

    #[test]
    fn test_scan_readable_regions_from_inventory() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x300)
            .unreadable(0x100, 0x100)
            .write_bytes(0x250, b"region two")
            .build();
        let scanner = MemoryScanner::new(&reader);

        let regions = reader.regions().unwrap();
        let found: Vec<_> = regions
            .readable_ranges()
            .filter_map(|range| scanner.find(b"region two", range, 1).ok().flatten())
            .collect();
        assert_eq!(found, vec![0x1250]);
    }
}

mod cancellation_tests {
    use super::*;

    #[test]
    fn test_cancelled_scan_is_not_not_found() {
        let reader = MockMemoryBuilder::new().with_size(0x1000).build();
        let token = CancellationToken::new();
        token.cancel();
        let scanner = MemoryScanner::new(&reader).with_cancellation(token);

        assert_eq!(
            scanner.find(b"missing", AddressRange::new(0x1000, 0x1000), 1),
            Err(ScanError::Cancelled)
        );
    }

    #[test]
    fn test_validation_precedes_cancellation() {
        let reader = ab_reader();
        let token = CancellationToken::new();
        token.cancel();
        let scanner = MemoryScanner::new(&reader).with_cancellation(token);

        assert_eq!(scanner.find(b"", AB_RANGE, 1), Err(ScanError::EmptyPattern));
    }
}

mod compat_tests {
    use super::*;

    #[test]
    fn test_sentinel_with_status() {
        let reader = ab_reader();
        let scanner = MemoryScanner::new(&reader);

        let found = find_in_memory_raw(&scanner, b"AB", AB_RANGE, 1);
        assert_eq!(found.address, 0x1008);
        assert!(found.is_success());

        let missing = find_in_memory_raw(&scanner, b"AB", AB_RANGE, 16);
        assert_eq!(missing.address, INVALID_ADDRESS);
        assert!(missing.is_success());

        let rejected = find_in_memory_raw(&scanner, b"AB", AddressRange::default(), 1);
        assert_eq!(rejected.address, INVALID_ADDRESS);
        assert!(!rejected.is_success());
    }
}
