mod test {
    use rand::{prelude::ThreadRng, Rng};
    use sensor_packet::{
        packet_len, parse_packet, unpack_stream, ChannelHeader, ChannelSource, ElementDescriptor,
        SensorPacketPacker, TypeTag,
    };

    const MAX_ELEMENTS: usize = 6;
    const MAX_TUPLES: u64 = 64;

    struct ChannelGenerator {
        rng: ThreadRng,
        count: usize,
    }

    impl ChannelGenerator {
        fn new() -> Self {
            Self {
                rng: rand::thread_rng(),
                count: 0,
            }
        }

        fn descriptor(&mut self) -> ElementDescriptor {
            match self.rng.gen_range(0..4) {
                0 => ElementDescriptor::int_bits(self.rng.gen(), self.rng.gen_range(1..32)),
                1 => ElementDescriptor::int_bytes(self.rng.gen(), self.rng.gen_range(1..17)),
                2 => ElementDescriptor::float_bytes(if self.rng.gen() { 4 } else { 8 }),
                _ => ElementDescriptor::float_bytes(self.rng.gen_range(1..32)),
            }
        }
    }

    impl Iterator for ChannelGenerator {
        /// Header and the wire body it describes.
        type Item = (ChannelHeader, Vec<u8>);

        fn next(&mut self) -> Option<Self::Item> {
            let elements = (0..self.rng.gen_range(1..=MAX_ELEMENTS))
                .map(|_| self.descriptor())
                .collect::<Vec<_>>();
            let tuples = self.rng.gen_range(0..MAX_TUPLES);
            let raw_tuple: u64 = elements.iter().map(|e| e.packed_bytes() as u64).sum();
            let body = (0..raw_tuple * tuples).map(|_| self.rng.gen()).collect();

            self.count += 1;
            let header = ChannelHeader::new(
                tuples,
                self.rng.gen_range(1.0..120.0),
                elements,
                format!("ch{}", self.count),
            )
            .unwrap();
            Some((header, body))
        }
    }

    fn random_packet(channels: &[(ChannelHeader, Vec<u8>)], timestamp: u64) -> Vec<u8> {
        let sources = channels
            .iter()
            .map(|(h, body)| ChannelSource::new(h.clone(), body.as_slice()))
            .collect::<Vec<_>>();
        SensorPacketPacker::builder()
            .set_ids(35, 36)
            .set_timestamp(timestamp)
            .set_frequency(120.0)
            .build()
            .pack(&sources)
            .unwrap()
    }

    #[test]
    fn pack_parse_pseudo_random() {
        let mut generator = ChannelGenerator::new();

        for round in 0..50u64 {
            let channels = generator.by_ref().take(round as usize % 8).collect::<Vec<_>>();
            let packet = random_packet(&channels, round);
            assert_eq!(packet_len(&packet).unwrap(), packet.len());

            let snapshot = parse_packet(&packet, None).unwrap();
            assert_eq!(snapshot.len(), channels.len());
            assert_eq!(snapshot.timestamp_ms(), round);

            for (header, body) in &channels {
                let channel = snapshot.get_channel(header.name()).unwrap();
                assert_eq!(channel.header(), header);
                assert_eq!(&channel.to_wire().unwrap(), body);
                assert_eq!(channel.dimensions(), &[header.num_tuples() as u32]);
            }
        }
    }

    #[test]
    fn promoted_values_keep_low_bytes() {
        let mut generator = ChannelGenerator::new();

        for (header, body) in generator.by_ref().take(200) {
            let packet = random_packet(&[(header.clone(), body.clone())], 0);
            let snapshot = parse_packet(&packet, None).unwrap();
            let channel = snapshot.get_channel(header.name()).unwrap();

            let raw_tuple: usize = header
                .elements()
                .iter()
                .map(|e| e.packed_bytes() as usize)
                .sum();
            for (i, tuple) in channel.tuples().enumerate() {
                let mut raw_off = i * raw_tuple;
                for (e, meta) in channel.element_metadata().iter().enumerate() {
                    let bytes = tuple.element_bytes(e).unwrap();
                    let packed = meta.packed_bytes as usize;
                    let (pad, low) = bytes.split_at(bytes.len() - packed);
                    assert!(pad.iter().all(|b| *b == 0));
                    assert_eq!(low, &body[raw_off..raw_off + packed]);
                    raw_off += packed;

                    match meta.promoted_type {
                        TypeTag::NonPrimitiveInt(n) | TypeTag::NonPrimitiveFloat(n) => {
                            assert_eq!(n as usize, packed);
                            assert!(tuple.value(e).is_none());
                        }
                        _ => assert!(tuple.value(e).is_some()),
                    }
                }
            }
        }
    }

    #[test]
    fn recording_of_pseudo_random_packets() {
        let mut generator = ChannelGenerator::new();
        let mut recording = Vec::new();
        let mut expected = Vec::new();

        for timestamp in 0..20u64 {
            let channels = generator.by_ref().take(3).collect::<Vec<_>>();
            let packet = random_packet(&channels, timestamp * 33);
            expected.push(parse_packet(&packet, None).unwrap());
            recording.extend_from_slice(&packet);
        }

        let snapshots = unpack_stream(&recording).unwrap();
        assert_eq!(snapshots, expected);
        println!(
            "Parsed {} packets from {} bytes",
            snapshots.len(),
            recording.len()
        );
    }

    #[cfg(feature = "unpacker")]
    #[test]
    fn parallel_unpack_pseudo_random() {
        let mut generator = ChannelGenerator::new();

        for _ in 0..20 {
            let channels = generator.by_ref().take(16).collect::<Vec<_>>();
            let packet = random_packet(&channels, 0);
            assert_eq!(
                sensor_packet::parse_packet_parallel(&packet, None).unwrap(),
                parse_packet(&packet, None).unwrap()
            );
        }
    }
}
