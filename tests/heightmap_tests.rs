//! Heightmap unit tests

#[cfg(test)]
mod tests {
    use iso_world::heightmap::{Heightmap, HeightmapCell, HeightmapError, TerrainSource};
    use iso_world::types::TileCoord;

    // -----------------------------------------------------------------------
    // Cell decoding
    // -----------------------------------------------------------------------

    #[test]
    fn decode_two_digit_code() {
        let cell = HeightmapCell::decode("4A").unwrap();
        assert_eq!(cell.walkable, 4);
        assert_eq!(cell.height, 10);
    }

    #[test]
    fn decode_packed_uses_fixed_layout() {
        let cell = HeightmapCell::decode_packed("0x0200").unwrap();
        assert_eq!(cell.walkable, 0);
        assert_eq!(cell.height, 0x200);

        let cell = HeightmapCell::decode_packed("0x4012").unwrap();
        assert_eq!(cell.walkable, 4);
        assert_eq!(cell.height, 0x12);

        assert_eq!(HeightmapCell::decode_packed("0x4000"), Some(HeightmapCell::new(0, 4)));
    }

    #[test]
    fn decode_packed_without_leading_zeros() {
        assert_eq!(HeightmapCell::decode_packed("0x2"), Some(HeightmapCell::new(2, 0)));
        assert_eq!(HeightmapCell::decode_packed("0x12"), Some(HeightmapCell::new(18, 0)));
        assert_eq!(HeightmapCell::decode_packed("0xFFF"), Some(HeightmapCell::new(0xFFF, 0)));
    }

    #[test]
    fn decode_packed_rejects_out_of_range() {
        assert!(HeightmapCell::decode_packed("0x10000").is_none());
        assert!(HeightmapCell::decode_packed("0x").is_none());
        assert!(HeightmapCell::decode_packed("0xG1").is_none());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(HeightmapCell::decode("1").is_none());
        assert!(HeightmapCell::decode("Z1").is_none());
        assert!(HeightmapCell::decode("").is_none());
        assert!(HeightmapCell::decode("0x123456").is_none());
    }

    #[test]
    fn walkability_threshold() {
        for class in 0u8..16 {
            let cell = HeightmapCell::new(0, class);
            assert_eq!(
                cell.is_walkable(),
                class < 4,
                "class {} walkability is wrong",
                class
            );
            assert_eq!(Heightmap::is_walkable(&cell), cell.is_walkable());
        }
    }

    // -----------------------------------------------------------------------
    // CSV format
    // -----------------------------------------------------------------------

    #[test]
    fn parse_csv_reads_header_and_rows() {
        let hm = Heightmap::parse_csv("0A,-3\n00,01,02\n40,11,0F\n").unwrap();
        assert_eq!(hm.left_offset, 10);
        assert_eq!(hm.top_offset, -3);
        assert_eq!(hm.width(), 3);
        assert_eq!(hm.height(), 2);

        assert_eq!(hm.get_cell(1, 0), Some(&HeightmapCell::new(1, 0)));
        assert_eq!(hm.get_cell(0, 1), Some(&HeightmapCell::new(0, 4)));
        assert_eq!(hm.get_cell(1, 1), Some(&HeightmapCell::new(1, 1)));
        assert_eq!(hm.get_cell(2, 1), Some(&HeightmapCell::new(15, 0)));
    }

    #[test]
    fn parse_csv_tolerates_trailing_commas_and_blank_lines() {
        let hm = Heightmap::parse_csv("0,0,\n\n00,01,\n02,03,\n\n").unwrap();
        assert_eq!(hm.width(), 2);
        assert_eq!(hm.height(), 2);
        assert_eq!(hm.get_cell(1, 1).unwrap().height, 3);
    }

    #[test]
    fn parse_csv_rejects_bad_header() {
        let err = Heightmap::parse_csv("nope\n00,00\n").unwrap_err();
        assert!(matches!(err, HeightmapError::MalformedHeader(_)));
    }

    #[test]
    fn parse_csv_reports_malformed_code_position() {
        let err = Heightmap::parse_csv("0,0\n00,00\n00,XX\n").unwrap_err();
        match err {
            HeightmapError::MalformedCode { row, col, code } => {
                assert_eq!((row, col), (1, 1));
                assert_eq!(code, "XX");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Heightmap::parse_csv("0,0\n00,00,00\n00,00\n").unwrap_err();
        assert!(matches!(
            err,
            HeightmapError::InconsistentRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(
            Heightmap::parse_csv("0,0\n"),
            Err(HeightmapError::Empty)
        ));
        assert!(matches!(Heightmap::parse_csv(""), Err(HeightmapError::Empty)));
    }

    // -----------------------------------------------------------------------
    // Packed format
    // -----------------------------------------------------------------------

    #[test]
    fn parse_packed_uses_supplied_offsets() {
        let hm = Heightmap::parse_packed("0x0000,0x0002,\n0x4000,0x1001,\n", -4, 7).unwrap();
        assert_eq!((hm.left_offset, hm.top_offset), (-4, 7));
        assert_eq!(hm.get_cell(1, 0).unwrap().height, 2);
        assert!(!hm.get_cell(0, 1).unwrap().is_walkable());
        assert!(hm.get_cell(1, 1).unwrap().is_walkable());
    }

    #[test]
    fn parse_packed_accepts_short_codes() {
        let hm = Heightmap::parse_packed("0x2,0x4000\n0x12,0x0002", 0, 0).unwrap();
        assert_eq!(hm.get_cell(0, 0), Some(&HeightmapCell::new(2, 0)));
        assert_eq!(hm.get_cell(1, 0), Some(&HeightmapCell::new(0, 4)));
        assert_eq!(hm.get_cell(0, 1), Some(&HeightmapCell::new(18, 0)));
        assert_eq!(hm.get_cell(1, 1), Some(&HeightmapCell::new(2, 0)));
    }

    #[test]
    fn parse_packed_reports_oversized_code() {
        assert!(matches!(
            Heightmap::parse_packed("0x0000,0x10000", 0, 0),
            Err(HeightmapError::MalformedCode { row: 0, col: 1, .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn out_of_range_lookups_are_absent() {
        let hm = Heightmap::parse_packed("0x0000,0x0000\n0x0000,0x0000", 0, 0).unwrap();
        assert!(hm.get_cell(-1, 0).is_none());
        assert!(hm.get_cell(0, -1).is_none());
        assert!(hm.get_cell(2, 0).is_none());
        assert!(hm.get_cell(0, 2).is_none());
        assert!(hm.cell_at(TileCoord::new(5, 5)).is_none());
        assert!(hm.ground_height(9, 9, 16.0).is_none());
    }

    #[test]
    fn ground_height_scales_by_tile_size() {
        let hm = Heightmap::parse_packed("0x0003", 0, 0).unwrap();
        assert_eq!(hm.ground_height(0, 0, 16.0), Some(48.0));
        assert_eq!(TerrainSource::width(&hm), 1);
        assert_eq!(TerrainSource::height(&hm), 1);
    }

    #[test]
    fn from_rows_requires_cells() {
        assert!(matches!(
            Heightmap::from_rows(0, 0, vec![]),
            Err(HeightmapError::Empty)
        ));
        assert!(matches!(
            Heightmap::from_rows(0, 0, vec![vec![]]),
            Err(HeightmapError::Empty)
        ));
    }
}
