#[cfg(feature = "unpacker")]
mod test {
    use sensor_packet::{
        unpack_stream, ChannelHeader, ChannelSource, DataPacker, Device, DeviceIdentity,
        ElementDescriptor, Sensor,
    };

    const WIDTH: usize = 8;
    const HEIGHT: usize = 6;
    const JOINTS: usize = 15;
    const FPS: f64 = 30.0;

    /// Depth frame, millimetres.
    struct DepthPacker<'a>(&'a [i16]);

    impl DataPacker for DepthPacker<'_> {
        fn write_into(&self, buf: &mut [u8]) -> usize {
            for (dst, v) in buf.chunks_exact_mut(2).zip(self.0) {
                dst.copy_from_slice(&v.to_be_bytes());
            }
            self.0.len() * 2
        }
    }

    /// x, y, z, confidence per joint.
    struct SkeletonPacker<'a>(&'a [[f32; 4]]);

    impl DataPacker for SkeletonPacker<'_> {
        fn write_into(&self, buf: &mut [u8]) -> usize {
            let values = self.0.iter().flatten();
            for (dst, v) in buf.chunks_exact_mut(4).zip(values) {
                dst.copy_from_slice(&v.to_be_bytes());
            }
            self.0.len() * 16
        }
    }

    struct Kinect {
        frame: u64,
        depth: Vec<i16>,
        rgb: Vec<u8>,
        skeleton: [[f32; 4]; JOINTS],
    }

    impl Kinect {
        fn new() -> Self {
            Self {
                frame: 0,
                depth: vec![0; WIDTH * HEIGHT],
                rgb: vec![0; WIDTH * HEIGHT * 3],
                skeleton: [[0.0; 4]; JOINTS],
            }
        }

        fn depth_at(frame: u64, row: usize, col: usize) -> i16 {
            (500 + frame as usize * 10 + row * WIDTH + col) as i16
        }
    }

    impl Device for Kinect {
        fn identity(&self) -> DeviceIdentity {
            DeviceIdentity {
                vendor_id: 0x045e,
                product_id: 0x02ae,
                frequency_hz: FPS,
                encryption_flags: 0,
            }
        }

        fn timestamp_ms(&self) -> u64 {
            (self.frame as f64 * 1000.0 / FPS) as u64
        }

        fn update_channels(&mut self) -> Vec<ChannelSource<'_>> {
            self.frame += 1;
            let frame = self.frame;
            for row in 0..HEIGHT {
                for col in 0..WIDTH {
                    self.depth[row * WIDTH + col] = Self::depth_at(frame, row, col);
                }
            }
            for (i, px) in self.rgb.chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[i as u8, frame as u8, 255 - i as u8]);
            }
            for (j, joint) in self.skeleton.iter_mut().enumerate() {
                *joint = [j as f32 * 0.5, frame as f32, -1.5, 1.0];
            }

            let pixels = (WIDTH * HEIGHT) as u64;
            let depth = ChannelHeader::new(
                pixels,
                FPS,
                vec![ElementDescriptor::int_bytes(true, 2)],
                "Depth",
            )
            .unwrap();
            let rgb = ChannelHeader::new(
                pixels,
                FPS,
                vec![ElementDescriptor::int_bytes(false, 1); 3],
                "RGB",
            )
            .unwrap();
            let user = ChannelHeader::new(
                JOINTS as u64,
                FPS,
                vec![ElementDescriptor::float_bytes(4); 4],
                "User1",
            )
            .unwrap();

            vec![
                ChannelSource::new(depth, DepthPacker(&self.depth)),
                ChannelSource::new(rgb, self.rgb.as_slice()),
                ChannelSource::new(user, SkeletonPacker(&self.skeleton)),
            ]
        }
    }

    #[test]
    fn kinect_snapshots() {
        let mut sensor = Sensor::builder(Kinect::new()).build().unwrap();
        assert_eq!(sensor.vendor_id(), 0x045e);
        assert_eq!(sensor.product_id(), 0x02ae);
        assert_eq!(sensor.frequency_hz(), FPS);

        for frame in 1..=5u64 {
            let mut snapshot = sensor.get_sensor_snapshot().unwrap();
            assert_eq!(
                snapshot.channel_names().into_iter().collect::<Vec<_>>(),
                vec!["Depth", "RGB", "User1"]
            );
            // stamped before the device advances
            assert_eq!(
                snapshot.timestamp_ms(),
                ((frame - 1) as f64 * 1000.0 / FPS) as u64
            );

            let depth = snapshot.get_channel_mut("Depth").unwrap();
            depth.set_dimensions(&[HEIGHT as u32, WIDTH as u32]).unwrap();
            for row in 0..HEIGHT {
                for col in 0..WIDTH {
                    let t = depth.get_tuple(&[row as u32, col as u32]).unwrap();
                    assert_eq!(t.get_i16(0).unwrap(), Kinect::depth_at(frame, row, col));
                }
            }

            let rgb = snapshot.get_channel("RGB").unwrap();
            let px = rgb.get_tuple(&[9]).unwrap();
            assert_eq!(px.len(), 3);
            assert_eq!(px.get_i8(1).unwrap() as u8, frame as u8);
            assert_eq!(px.get_i16_coerced(2), (255 - 9u8) as i8 as i16);

            let user = snapshot.get_channel("User1").unwrap();
            assert_eq!(user.tuple_size(), 16);
            let head = user.get_tuple(&[3]).unwrap();
            assert_eq!(head.get_f32(0).unwrap(), 1.5);
            assert_eq!(head.get_f32(1).unwrap(), frame as f32);
            assert_eq!(head.get_f64_coerced(2), -1.5);
        }
        assert_eq!(sensor.device().frame, 5);
    }

    #[test]
    fn parallel_kinect_snapshots() {
        let mut sequential = Sensor::new(Kinect::new()).unwrap();
        let mut parallel = Sensor::builder(Kinect::new())
            .set_parallel(true)
            .build()
            .unwrap();

        for _ in 0..3 {
            assert_eq!(
                parallel.get_sensor_snapshot().unwrap(),
                sequential.get_sensor_snapshot().unwrap()
            );
        }
    }

    #[test]
    fn record_and_replay() {
        let mut kinect = Kinect::new();
        let recording = (0..10)
            .flat_map(|_| kinect.sensor_packet().unwrap())
            .collect::<Vec<_>>();

        let snapshots = unpack_stream(&recording).unwrap();
        assert_eq!(snapshots.len(), 10);
        for (i, snapshot) in snapshots.iter().enumerate() {
            let depth = snapshot.get_channel("Depth").unwrap();
            let first = depth.get_tuple(&[0]).unwrap().get_i16(0).unwrap();
            assert_eq!(first, Kinect::depth_at(i as u64 + 1, 0, 0));
        }
    }

    #[test]
    fn export_simulation() {
        let mut sensor = Sensor::new(Kinect::new()).unwrap();
        let mut snapshot = sensor.get_sensor_snapshot().unwrap();
        snapshot
            .get_channel_mut("Depth")
            .unwrap()
            .set_dimensions(&[HEIGHT as u32, WIDTH as u32])
            .unwrap();

        let dir = tempdir::TempDir::new("export_simulation").expect("Failed to create result dir");
        let files = snapshot.save_as_csv(dir.path()).expect("Failed to save snapshot");
        assert_eq!(files.len(), 3);

        let depth = std::fs::read_to_string(&files[0]).unwrap();
        let mut lines = depth.lines();
        assert_eq!(lines.next(), Some("Channel;Depth"));
        assert_eq!(lines.next(), Some("Frequency;30;Hz"));
        assert_eq!(
            lines.next().unwrap(),
            format!("Tuples;{};Dimensions;{}x{}", WIDTH * HEIGHT, HEIGHT, WIDTH)
        );
        assert_eq!(lines.next(), Some("Index;e0 (int16)"));
        assert_eq!(lines.count(), WIDTH * HEIGHT);

        let user = std::fs::read_to_string(&files[2]).unwrap();
        assert!(user.lines().any(|l| l == "1;0.5;1;-1.5;1"));
    }
}
