//! Pending-expiration queue для отложенных эффектов
//!
//! Архитектура:
//! - Каждый отложенный эффект (muzzle flash hide, reload finish, color revert)
//!   хранится как запись с абсолютным deadline внутри компонента-владельца
//! - Очередь опрашивается внутри обычного FixedUpdate pass — никаких
//!   host-scheduled callbacks между тиками
//! - Cancellation = supersede: структурная замена записей с тем же ключом

/// Одна запись очереди: absolute deadline (секунды) + ключ эффекта
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerEntry<K> {
    pub due_at: f64,
    pub key: K,
}

/// Очередь отложенных эффектов, отсортирована по deadline (ближайший первым)
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    entries: Vec<TimerEntry<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn next_due(&self) -> Option<f64> {
        self.entries.first().map(|e| e.due_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq> TimerQueue<K> {
    /// Добавить запись; порядок по due_at сохраняется.
    /// Записи с одинаковым deadline срабатывают в порядке добавления.
    pub fn schedule(&mut self, due_at: f64, key: K) {
        let idx = self.entries.partition_point(|e| e.due_at <= due_at);
        self.entries.insert(idx, TimerEntry { due_at, key });
    }

    /// Заменить все записи с этим ключом одной новой
    /// (новый flash вытесняет pending hide того же вида)
    pub fn supersede(&mut self, due_at: f64, key: K) {
        self.entries.retain(|e| e.key != key);
        self.schedule(due_at, key);
    }

    /// Снять ближайшую запись, если её deadline наступил
    pub fn pop_due(&mut self, now: f64) -> Option<TimerEntry<K>> {
        match self.entries.first() {
            Some(entry) if entry.due_at <= now => Some(self.entries.remove(0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Flash,
        Reload,
    }

    #[test]
    fn test_pop_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(2.0, Kind::Reload);
        queue.schedule(1.0, Kind::Flash);

        let first = queue.pop_due(5.0).unwrap();
        assert_eq!(first.key, Kind::Flash);
        assert_eq!(first.due_at, 1.0);

        let second = queue.pop_due(5.0).unwrap();
        assert_eq!(second.key, Kind::Reload);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_nothing_pops_before_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(1.0, Kind::Flash);

        assert!(queue.pop_due(0.5).is_none());
        assert_eq!(queue.len(), 1);

        // Ровно на deadline — срабатывает
        assert!(queue.pop_due(1.0).is_some());
    }

    #[test]
    fn test_supersede_replaces_same_key_only() {
        let mut queue = TimerQueue::new();
        queue.schedule(1.0, Kind::Flash);
        queue.schedule(2.0, Kind::Reload);

        // Новый flash вытесняет старый, reload не трогаем
        queue.supersede(3.0, Kind::Flash);
        assert_eq!(queue.len(), 2);

        let first = queue.pop_due(10.0).unwrap();
        assert_eq!(first.key, Kind::Reload);

        let second = queue.pop_due(10.0).unwrap();
        assert_eq!(second.key, Kind::Flash);
        assert_eq!(second.due_at, 3.0);
    }

    #[test]
    fn test_equal_deadlines_fire_in_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(1.0, Kind::Flash);
        queue.schedule(1.0, Kind::Reload);

        assert_eq!(queue.pop_due(1.0).unwrap().key, Kind::Flash);
        assert_eq!(queue.pop_due(1.0).unwrap().key, Kind::Reload);
    }
}
