use smallvec::SmallVec;
use std::fmt;

/// Геометрия одного активного выхода (монитора)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputGeometry {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl OutputGeometry {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for OutputGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}x{}+{}+{}", self.name, self.width, self.height, self.x, self.y)
    }
}

/// Каноническое описание расстановки мониторов.
///
/// Выходы отсортированы по имени, поэтому два зондирования неизменной
/// конфигурации дают равные значения независимо от порядка, в котором
/// сервер перечислил выходы. Используется как ключ хранилища.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayLayout {
    outputs: SmallVec<[OutputGeometry; 4]>,
}

impl DisplayLayout {
    pub fn from_outputs<I>(outputs: I) -> Self
    where
        I: IntoIterator<Item = OutputGeometry>,
    {
        let mut outputs: SmallVec<[OutputGeometry; 4]> = outputs.into_iter().collect();
        outputs.sort();
        Self { outputs }
    }

    #[allow(dead_code)]
    pub fn outputs(&self) -> &[OutputGeometry] {
        &self.outputs
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl fmt::Display for DisplayLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, output) in self.outputs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", output)?;
        }
        Ok(())
    }
}
